// Async drivers for one play session: a throttled detection loop and a fixed-rate frame loop.
//
// Detection results cross over through a `watch` cell holding only the newest `GestureState`;
// the frame loop never blocks on detection and detection never waits on rendering.

use super::detection::{GestureTracker, HandObserver};
use super::session::GameSession;
use super::types::{ControlCommand, FrameReport, GestureState, RunState};
use crate::domain::{GameTuning, HandReading, Projector};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Runtime wiring for one session. Gameplay knobs live in `tuning`.
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub tuning: GameTuning,
    /// Fixed seed for target placement; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Render frame spacing.
    pub frame_interval: Duration,
    /// Minimum spacing between two classification cycles.
    pub detection_interval: Duration,
    /// Upper bound on one frame's time step, so a stalled task does not teleport targets.
    pub max_frame_step: Duration,
    pub reading_channel_capacity: usize,
    pub control_channel_capacity: usize,
    pub frame_broadcast_capacity: usize,
}

/// Channels into and out of a running session. Dropping it stops both loops.
pub struct GameHandle {
    pub session_id: u64,
    /// Raw hand readings from the tracker.
    pub reading_tx: mpsc::Sender<HandReading>,
    pub control_tx: mpsc::Sender<ControlCommand>,
    /// One report per rendered frame.
    pub frame_tx: broadcast::Sender<FrameReport>,
    pub gesture_rx: watch::Receiver<GestureState>,
    pub run_state_rx: watch::Receiver<RunState>,
}

/// Starts the detection and frame loops for a new session.
pub fn spawn_game(
    session_id: u64,
    settings: GameSettings,
    projector: Box<dyn Projector>,
) -> GameHandle {
    let (reading_tx, reading_rx) =
        mpsc::channel::<HandReading>(settings.reading_channel_capacity);
    let (control_tx, control_rx) =
        mpsc::channel::<ControlCommand>(settings.control_channel_capacity);
    let (frame_tx, _frame_rx) = broadcast::channel::<FrameReport>(settings.frame_broadcast_capacity);
    let (gesture_tx, gesture_rx) = watch::channel(GestureState::default());
    let (run_state_tx, run_state_rx) = watch::channel(RunState::Running);

    let tracker = GestureTracker::new(settings.tuning.gesture, &settings.tuning.aim);
    tokio::spawn(detection_task(
        reading_rx,
        gesture_tx,
        tracker,
        settings.detection_interval,
    ));

    let session = GameSession::new(settings.tuning, settings.seed);
    tokio::spawn(frame_task(
        session,
        projector,
        gesture_rx.clone(),
        control_rx,
        frame_tx.clone(),
        run_state_tx,
        settings.frame_interval,
        settings.max_frame_step,
    ));

    info!(session_id, "session started");
    GameHandle {
        session_id,
        reading_tx,
        control_tx,
        frame_tx,
        gesture_rx,
        run_state_rx,
    }
}

/// Classifies hand readings at most once per `min_spacing`.
///
/// Readings that pile up while a cycle is pending are coalesced: only the newest hand is
/// classified, but a "no hand" in between is always published first so the loss is not missed.
pub async fn detection_task(
    mut reading_rx: mpsc::Receiver<HandReading>,
    gesture_tx: watch::Sender<GestureState>,
    mut tracker: impl HandObserver,
    min_spacing: Duration,
) {
    let mut next_cycle = Instant::now();

    while let Some(first) = reading_rx.recv().await {
        tokio::time::sleep_until(next_cycle).await;
        next_cycle = Instant::now() + min_spacing;

        let mut lost = false;
        let mut latest = None;
        let mut pending = Some(first);
        while let Some(reading) = pending {
            match reading {
                HandReading::NoHand => {
                    lost = true;
                    latest = None;
                }
                HandReading::Hand(frame) => latest = Some(frame),
            }
            pending = reading_rx.try_recv().ok();
        }

        let mut cycle = Vec::with_capacity(2);
        if lost {
            cycle.push(HandReading::NoHand);
        }
        if let Some(frame) = latest {
            cycle.push(HandReading::Hand(frame));
        }

        for reading in cycle {
            match catch_unwind(AssertUnwindSafe(|| tracker.observe(&reading))) {
                Ok(state) => {
                    // Receivers only care about the newest value; a send error means none are left.
                    if gesture_tx.send(state).is_err() {
                        debug!("gesture state has no readers; detection exiting");
                        return;
                    }
                }
                Err(_) => error!("hand classification panicked; sample skipped"),
            }
        }
    }

    debug!("hand readings closed; detection exiting");
}

/// Fixed-rate render loop. Runs until the control channel closes.
#[allow(clippy::too_many_arguments)]
pub async fn frame_task(
    mut session: GameSession,
    projector: Box<dyn Projector>,
    mut gesture_rx: watch::Receiver<GestureState>,
    mut control_rx: mpsc::Receiver<ControlCommand>,
    frame_tx: broadcast::Sender<FrameReport>,
    run_state_tx: watch::Sender<RunState>,
    frame_interval: Duration,
    max_frame_step: Duration,
) {
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick: u64 = 0;
    let mut last_frame = Instant::now();
    let mut paused = false;

    loop {
        let command = if paused {
            // No frames while paused: session time stands still.
            match control_rx.recv().await {
                Some(command) => command,
                None => break,
            }
        } else {
            tokio::select! {
                command = control_rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
                at = interval.tick() => {
                    let dt = at.saturating_duration_since(last_frame).min(max_frame_step);
                    last_frame = at;
                    tick += 1;

                    let gesture = *gesture_rx.borrow_and_update();
                    let mut report = FrameReport::new(tick);
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        session.advance(dt, &gesture, projector.as_ref(), &mut report)
                    }));
                    match outcome {
                        // No subscribers is fine; the session keeps running headless.
                        Ok(_) => {
                            let _ = frame_tx.send(report);
                        }
                        Err(_) => error!(tick, "frame update panicked; frame dropped"),
                    }
                    continue;
                }
            }
        };

        match command {
            ControlCommand::Pause if !paused => {
                paused = true;
                let _ = run_state_tx.send(RunState::Paused);
                info!(tick, "session paused");
            }
            ControlCommand::Resume if paused => {
                paused = false;
                // The first frame after resuming starts a fresh step instead of covering the pause.
                interval.reset();
                last_frame = Instant::now();
                let _ = run_state_tx.send(RunState::Running);
                info!(tick, "session resumed");
            }
            ControlCommand::Pause | ControlCommand::Resume => {
                debug!(?command, paused, "control command had no effect");
            }
            ControlCommand::Restart => {
                tick += 1;
                let mut report = FrameReport::new(tick);
                match catch_unwind(AssertUnwindSafe(|| session.reset(&mut report))) {
                    Ok(()) => {
                        let _ = frame_tx.send(report);
                    }
                    Err(_) => warn!(tick, "session restart panicked"),
                }
            }
        }
    }

    debug!(tick, "control channel closed; frame loop exiting");
}
