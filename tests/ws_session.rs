mod support;

use serde_json::json;
use support::{connect, finger_gun, next_message, next_of_type, send_json};

fn ready_hello() -> serde_json::Value {
    json!({
        "type": "hello",
        "data": {
            "camera": { "status": "ready" },
            "viewport": { "width": 1024.0, "height": 768.0 }
        }
    })
}

#[tokio::test]
async fn camera_failure_ends_the_connection_with_a_fatal() {
    let mut client = connect().await;
    send_json(
        &mut client,
        json!({
            "type": "hello",
            "data": { "camera": { "status": "unavailable", "reason": "no device" } }
        }),
    )
    .await;

    let fatal = next_message(&mut client).await.expect("fatal before close");
    assert_eq!(fatal["type"], "fatal");
    assert_eq!(fatal["data"]["kind"], "camera_unavailable");

    let closed = next_message(&mut client).await;
    assert_eq!(closed, Err("camera_unavailable".to_string()));
}

#[tokio::test]
async fn first_message_must_be_hello() {
    let mut client = connect().await;
    send_json(&mut client, json!({ "type": "pause" })).await;

    assert_eq!(
        next_message(&mut client).await,
        Err("hello required".to_string())
    );
}

#[tokio::test]
async fn ready_camera_starts_a_session_that_streams_frames() {
    let mut client = connect().await;
    send_json(&mut client, ready_hello()).await;

    let welcome = next_message(&mut client).await.expect("welcome");
    assert_eq!(welcome["type"], "welcome");
    assert!(welcome["data"]["session_id"].is_string());
    assert_eq!(welcome["data"]["camera"]["width"], 1024.0);
    assert_eq!(welcome["data"]["tuning"]["screen"]["height"], 768.0);

    let frame = next_of_type(&mut client, "frame").await;
    assert!(frame["data"]["tick"].as_u64().is_some());
    assert_eq!(frame["data"]["hud"]["score"], 0);
}

#[tokio::test]
async fn landmarks_drive_the_aim_state() {
    let mut client = connect().await;
    send_json(&mut client, ready_hello()).await;
    next_of_type(&mut client, "welcome").await;

    send_json(&mut client, finger_gun(true)).await;

    let mut aiming = false;
    for _ in 0..120 {
        let frame = next_of_type(&mut client, "frame").await;
        if frame["data"]["hud"]["is_aiming"] == true {
            aiming = true;
            break;
        }
    }
    assert!(aiming, "finger gun never registered as aiming");

    send_json(&mut client, json!({ "type": "no_hand" })).await;
    let mut released = false;
    for _ in 0..120 {
        let frame = next_of_type(&mut client, "frame").await;
        if frame["data"]["hud"]["is_aiming"] == false {
            released = true;
            break;
        }
    }
    assert!(released, "losing the hand did not stop aiming");
}

#[tokio::test]
async fn pause_and_resume_are_reported() {
    let mut client = connect().await;
    send_json(&mut client, ready_hello()).await;
    next_of_type(&mut client, "welcome").await;

    send_json(&mut client, json!({ "type": "pause" })).await;
    let paused = next_of_type(&mut client, "run_state").await;
    assert_eq!(paused["data"], "paused");

    send_json(&mut client, json!({ "type": "resume" })).await;
    let running = next_of_type(&mut client, "run_state").await;
    assert_eq!(running["data"], "running");
}

#[tokio::test]
async fn malformed_messages_are_ignored() {
    let mut client = connect().await;
    send_json(&mut client, ready_hello()).await;
    next_of_type(&mut client, "welcome").await;

    send_json(&mut client, json!({ "type": "landmarks", "data": { "points": [] } })).await;
    send_json(&mut client, json!({ "type": "teleport" })).await;

    // Still connected and still rendering.
    next_of_type(&mut client, "frame").await;
}
