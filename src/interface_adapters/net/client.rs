use crate::domain::{HandReading, LandmarkFrame, StartupError};
use crate::interface_adapters::projection::PerspectiveProjector;
use crate::interface_adapters::protocol::{
    CameraDto, ClientMessage, FatalDto, FrameDto, HelloPayload, ServerMessage, WelcomeDto,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_id;
use crate::use_cases::{ControlCommand, FrameReport, GameHandle, RunState, spawn_game};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    Camera(StartupError),
    HelloRequired,
    HelloTimeout,
    ClosedBeforeHello,
    SessionClosed,
    FramesClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

enum LoopControl {
    Continue,
    Disconnect,
}

/// Serializes each frame once and keeps the newest bytes around for lag recovery.
pub async fn frame_serializer(
    mut frame_rx: broadcast::Receiver<FrameReport>,
    frame_bytes_tx: broadcast::Sender<Utf8Bytes>,
    frame_latest_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match frame_rx.recv().await {
            Ok(report) => {
                let msg = ServerMessage::Frame(FrameDto::from(report));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize frame");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                let _ = frame_latest_tx.send(bytes.clone());
                let _ = frame_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "frame serializer lagged; skipping to latest frame");
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("frame channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = next_id();
    let span = info_span!("conn", conn_id, session_id = tracing::field::Empty);
    serve_connection(socket, state, span.clone())
        .instrument(span)
        .await
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>, span: Span) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeHello) => {
            info!("client disconnected before hello");
            return;
        }
        Err(NetError::Camera(err)) => {
            info!(kind = err.kind(), "camera failed; no session started");
            return;
        }
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = send_close_with_reason(&mut socket, close_code::POLICY, "bootstrap failed").await;
            return;
        }
    };

    span.record("session_id", ctx.game.session_id);
    info!(session_id = ctx.game.session_id, "client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }

    info!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        invalid_landmarks = ctx.invalid_landmarks,
        dropped_readings = ctx.dropped_readings,
        lag_recoveries = ctx.lag_recovery_count,
        "client disconnected"
    );
    // Dropping the context drops the game handle, which stops both session loops.
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

struct ConnCtx {
    // Owns the session; dropped on disconnect.
    game: GameHandle,
    frame_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    // Latest serialized frame for lag recovery.
    frame_latest_rx: watch::Receiver<Utf8Bytes>,
    run_state_rx: watch::Receiver<RunState>,
    lag_recovery_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,
    invalid_landmarks: u64,
    dropped_readings: u64,

    last_reading_full_log: Instant,
    last_frame_lag_log: Instant,
    last_invalid_log: Instant,

    close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    let (hello, hello_bytes) = match timeout(HELLO_TIMEOUT, read_hello(socket)).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "hello timeout").await;
            return Err(NetError::HelloTimeout);
        }
    };

    // Camera trouble is reported to the player and ends the connection before any session exists.
    if let Err(err) = hello.camera.into_result() {
        warn!(kind = err.kind(), error = %err, "camera startup failed");
        let _ = send_message(socket, &ServerMessage::Fatal(FatalDto::from(&err))).await;
        let _ = send_close_with_reason(socket, close_code::NORMAL, err.kind()).await;
        return Err(NetError::Camera(err));
    }

    let mut settings = state.session_template.clone();
    match hello.viewport {
        Some(viewport) if viewport.is_valid() => {
            settings.tuning.screen.width = viewport.width;
            settings.tuning.screen.height = viewport.height;
        }
        Some(viewport) => {
            warn!(?viewport, "ignoring unusable viewport; keeping configured size");
        }
        None => {}
    }

    let session_id = next_id();
    let welcome = ServerMessage::Welcome(WelcomeDto {
        session_id: session_id.to_string(),
        tuning: settings.tuning.clone(),
        camera: CameraDto::from(&settings.tuning.screen),
    });

    let frame_capacity = settings.frame_broadcast_capacity;
    let projector = PerspectiveProjector::new(&settings.tuning.screen);
    let game = spawn_game(session_id, settings, Box::new(projector));

    // Subscribe before the first await on the socket so no early frame is lost.
    let (frame_bytes_tx, frame_bytes_rx) = broadcast::channel::<Utf8Bytes>(frame_capacity);
    let (frame_latest_tx, frame_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
    tokio::spawn(frame_serializer(
        game.frame_tx.subscribe(),
        frame_bytes_tx,
        frame_latest_tx,
    ));
    let run_state_rx = game.run_state_rx.clone();

    let bytes_out = send_message(socket, &welcome).await?;

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        game,
        frame_bytes_rx,
        frame_latest_rx,
        run_state_rx,
        lag_recovery_count: 0,

        msgs_in: 1,
        msgs_out: 1,
        bytes_in: hello_bytes,
        bytes_out: bytes_out as u64,

        invalid_json: 0,
        invalid_landmarks: 0,
        dropped_readings: 0,

        last_reading_full_log: now,
        last_frame_lag_log: now,
        last_invalid_log: now,

        close_frame: None,
    })
}

/// Waits for the first text message, which must be a hello. Returns it with its size in bytes.
async fn read_hello(socket: &mut WebSocket) -> Result<(HelloPayload, u64), NetError> {
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeHello);
        };

        match incoming.map_err(NetError::Ws)? {
            Message::Text(text) => {
                let bytes_in = text.len() as u64;
                return match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Hello(payload)) => Ok((payload, bytes_in)),
                    Ok(_) => {
                        let _ =
                            send_close_with_reason(socket, close_code::POLICY, "hello required")
                                .await;
                        Err(NetError::HelloRequired)
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid hello payload",
                        )
                        .await;
                        Err(NetError::HelloRequired)
                    }
                };
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::HelloRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeHello),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

enum Event {
    Incoming(Option<Result<Message, axum::Error>>),
    Frame(Result<Utf8Bytes, broadcast::error::RecvError>),
    RunState(Result<(), watch::error::RecvError>),
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let event = tokio::select! {
            incoming = socket.recv() => Event::Incoming(incoming),
            frame = ctx.frame_bytes_rx.recv() => Event::Frame(frame),
            changed = ctx.run_state_rx.changed() => Event::RunState(changed),
        };

        let control = match event {
            Event::Incoming(incoming) => match handle_incoming_ws(incoming, ctx).await {
                Ok(control) => control,
                Err(e) => {
                    fatal = Some(e);
                    LoopControl::Disconnect
                }
            },
            Event::Frame(Ok(bytes)) => forward_frame_bytes(bytes, socket, ctx).await,
            Event::Frame(Err(broadcast::error::RecvError::Lagged(n))) => {
                recover_from_lag(n, socket, ctx).await
            }
            Event::Frame(Err(broadcast::error::RecvError::Closed)) => {
                fatal = Some(NetError::FramesClosed);
                LoopControl::Disconnect
            }
            Event::RunState(Ok(())) => {
                let run_state = *ctx.run_state_rx.borrow_and_update();
                match send_message(socket, &ServerMessage::RunState(run_state.into())).await {
                    Ok(bytes) => {
                        ctx.msgs_out += 1;
                        ctx.bytes_out += bytes as u64;
                        LoopControl::Continue
                    }
                    Err(err) => {
                        warn!(error = ?err, "failed to send run state");
                        LoopControl::Disconnect
                    }
                }
            }
            Event::RunState(Err(_)) => {
                fatal = Some(NetError::SessionClosed);
                LoopControl::Disconnect
            }
        };

        if let LoopControl::Disconnect = control {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, axum::Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let msg = match incoming {
        Some(Ok(msg)) => msg,
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            return Ok(LoopControl::Disconnect);
        }
        None => {
            info!("websocket closed");
            return Ok(LoopControl::Disconnect);
        }
    };

    let text = match msg {
        Message::Text(text) => text,
        Message::Binary(_) => {
            ctx.close_frame = Some(CloseFrame {
                code: close_code::UNSUPPORTED,
                reason: "binary messages not supported".into(),
            });
            return Ok(LoopControl::Disconnect);
        }
        Message::Ping(_) | Message::Pong(_) => return Ok(LoopControl::Continue),
        Message::Close(_) => return Ok(LoopControl::Disconnect),
    };

    ctx.msgs_in += 1;
    ctx.bytes_in += text.len() as u64;

    match serde_json::from_str::<ClientMessage>(&text) {
        Ok(ClientMessage::Hello(_)) => {
            if should_log(&mut ctx.last_invalid_log) {
                warn!("duplicate hello ignored");
            }
            Ok(LoopControl::Continue)
        }
        Ok(ClientMessage::Landmarks(payload)) => match LandmarkFrame::try_from(payload) {
            Ok(frame) => forward_reading(ctx, HandReading::Hand(frame)),
            Err(err) => {
                ctx.invalid_landmarks += 1;
                if should_log(&mut ctx.last_invalid_log) {
                    warn!(error = %err, "invalid landmarks; dropping");
                }
                Ok(LoopControl::Continue)
            }
        },
        // A tracking loss is never dropped, even when the queue is full.
        Ok(ClientMessage::NoHand) => {
            ctx.game
                .reading_tx
                .send(HandReading::NoHand)
                .await
                .map_err(|_| NetError::SessionClosed)?;
            Ok(LoopControl::Continue)
        }
        Ok(ClientMessage::Pause) => send_control(ctx, ControlCommand::Pause).await,
        Ok(ClientMessage::Resume) => send_control(ctx, ControlCommand::Resume).await,
        Ok(ClientMessage::Restart) => send_control(ctx, ControlCommand::Restart).await,
        Err(parse_err) => {
            ctx.invalid_json += 1;
            if should_log(&mut ctx.last_invalid_log) {
                warn!(
                    bytes = text.len(),
                    error = %parse_err,
                    "failed to parse client message"
                );
            }

            if ctx.invalid_json > MAX_INVALID_JSON {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "too many invalid messages".into(),
                });
                return Ok(LoopControl::Disconnect);
            }
            Ok(LoopControl::Continue)
        }
    }
}

fn forward_reading(ctx: &mut ConnCtx, reading: HandReading) -> Result<LoopControl, NetError> {
    match ctx.game.reading_tx.try_send(reading) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_)) => {
            // Detection is behind; a newer reading will follow shortly.
            ctx.dropped_readings += 1;
            if should_log(&mut ctx.last_reading_full_log) {
                warn!(dropped = ctx.dropped_readings, "reading queue full; dropping landmarks");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_)) => Err(NetError::SessionClosed),
    }
}

async fn send_control(ctx: &mut ConnCtx, command: ControlCommand) -> Result<LoopControl, NetError> {
    debug!(?command, "control command");
    ctx.game
        .control_tx
        .send(command)
        .await
        .map_err(|_| NetError::SessionClosed)?;
    Ok(LoopControl::Continue)
}

async fn forward_frame_bytes(
    frame: Utf8Bytes,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> LoopControl {
    let bytes_len = frame.len();
    match socket.send(Message::Text(frame)).await.map_err(NetError::Ws) {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send frame");
            LoopControl::Disconnect
        }
    }
}

async fn recover_from_lag(missed: u64, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    if should_log(&mut ctx.last_frame_lag_log) {
        warn!(missed, "frames lagged; sending latest");
    }

    // Jump past the backlog; only the newest frame matters to the player.
    ctx.frame_bytes_rx = ctx.frame_bytes_rx.resubscribe();
    let latest = ctx.frame_latest_rx.borrow().clone();
    if latest.is_empty() {
        return LoopControl::Continue;
    }

    ctx.lag_recovery_count += 1;
    forward_frame_bytes(latest, socket, ctx).await
}
