// Boots one shared server per test binary and hands out websocket URLs.
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// host:port of the running server, published by the server thread.
static SERVER_ADDR: OnceLock<String> = OnceLock::new();

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub fn ensure_server() -> &'static str {
    SERVER_ADDR.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);
        // The server gets its own thread and runtime so it outlives each `#[tokio::test]` runtime.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(addr.to_string());
                gesture_shooter::run(listener).await.expect("server failed");
            });
        });
        wait_until_accepting(&published)
    })
}

fn wait_until_accepting(published: &OnceLock<String>) -> String {
    let addr = loop {
        if let Some(addr) = published.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return addr;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}

pub async fn connect() -> Client {
    let url = format!("ws://{}/ws", ensure_server());
    let (client, _response) = connect_async(url).await.expect("websocket connect");
    client
}

pub async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("send message");
}

/// Next server message of any kind. `Err` carries the close reason once the server hangs up.
pub async fn next_message(client: &mut Client) -> Result<Value, String> {
    loop {
        let next = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("server went quiet");
        match next {
            Some(Ok(Message::Text(text))) => {
                return Ok(serde_json::from_str(text.as_str()).expect("server sends json"));
            }
            Some(Ok(Message::Close(frame))) => {
                return Err(frame.map(|f| f.reason.as_str().to_owned()).unwrap_or_default());
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.to_string()),
            None => return Err(String::new()),
        }
    }
}

/// Skips frames and other traffic until a message of type `kind` arrives.
pub async fn next_of_type(client: &mut Client, kind: &str) -> Value {
    loop {
        let message = next_message(client)
            .await
            .unwrap_or_else(|reason| panic!("closed while waiting for {kind}: {reason}"));
        if message["type"] == kind {
            return message;
        }
    }
}

/// Upright finger gun in model order, thumb cocked or dropped.
pub fn finger_gun(thumb_up: bool) -> Value {
    let mut points = vec![(0.5, 0.5); 21];
    points[0] = (0.50, 0.80);
    points[1] = (0.44, 0.74);
    points[2] = (0.40, 0.68);
    points[3] = (0.38, 0.62);
    points[4] = if thumb_up { (0.37, 0.55) } else { (0.42, 0.64) };
    points[5] = (0.47, 0.60);
    points[6] = (0.47, 0.50);
    points[7] = (0.47, 0.43);
    points[8] = (0.47, 0.36);
    for (base, x) in [(9, 0.51), (13, 0.55), (17, 0.59)] {
        points[base] = (x, 0.61);
        points[base + 1] = (x, 0.55);
        points[base + 2] = (x, 0.60);
        points[base + 3] = (x, 0.66);
    }
    let points: Vec<Value> = points
        .into_iter()
        .map(|(x, y)| serde_json::json!({ "x": x, "y": y }))
        .collect();
    serde_json::json!({ "type": "landmarks", "data": { "points": points } })
}
