// One play session: gesture ingestion, magnetic aim, fire resolution and target upkeep.
//
// The session is driven by the frame loop and owns all mutable game state. Collaborators are
// handed in per call so the session never outlives them or holds a reference across frames.

use super::types::GestureState;
use crate::domain::magnet::{self, MagnetConfig};
use crate::domain::tuning::seconds;
use crate::domain::{
    AudioCue, AudioSink, GameTuning, HitOutcome, HitTier, HudSnapshot, Presentation, Projector,
    RegistryEvent, SceneSink, ScoreSnapshot, Scoreboard, Smoother, Target, TargetId,
    TargetRegistry, TargetVisual, TriggerDetector, TriggerState,
};
use glam::{Vec2, Vec3};
use std::time::Duration;
use tracing::{debug, info};

/// Every collaborator one frame talks to, besides the camera model.
pub trait FrameSink: AudioSink + SceneSink + Presentation {}

impl<T: AudioSink + SceneSink + Presentation> FrameSink for T {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotOutcome {
    Hit {
        target_id: TargetId,
        outcome: HitOutcome,
    },
    Miss,
}

/// Point-in-time copy of the session counters and lock state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    pub score: ScoreSnapshot,
    pub last_hit_at: Option<Duration>,
    pub locked_target: Option<TargetId>,
    pub was_locked: bool,
    pub is_shooting: bool,
    pub shooting_until: Option<Duration>,
    pub trigger: TriggerState,
}

pub struct GameSession {
    tuning: GameTuning,
    /// Session time. Only advances while frames are being run.
    clock: Duration,
    board: Scoreboard,
    trigger: TriggerDetector,
    registry: TargetRegistry,
    crosshair: Smoother,
    locked: Option<TargetId>,
    was_locked: bool,
    gesture: GestureState,
    last_seq: u64,
    last_losses: u64,
}

impl GameSession {
    pub fn new(tuning: GameTuning, seed: Option<u64>) -> Self {
        let mut registry = TargetRegistry::new(tuning.targets.clone(), seed);
        // Nothing is on the field yet, so there is nothing to tell the renderer.
        let _ = registry.start(Duration::ZERO);

        Self {
            board: Scoreboard::new(tuning.scoring),
            trigger: TriggerDetector::new(cooldown(&tuning)),
            crosshair: Smoother::new(tuning.aim.crosshair_smoothing),
            registry,
            tuning,
            clock: Duration::ZERO,
            locked: None,
            was_locked: false,
            gesture: GestureState::default(),
            last_seq: 0,
            last_losses: 0,
        }
    }

    /// Clears score, lock and trigger state and refills the field from scratch.
    pub fn reset(&mut self, sink: &mut impl FrameSink) {
        self.clock = Duration::ZERO;
        self.board = Scoreboard::new(self.tuning.scoring);
        self.trigger.reset();
        self.crosshair.clear();
        self.clear_lock();
        for event in self.registry.start(self.clock) {
            forward(event, sink);
        }
        sink.show(&self.hud(self.crosshair.value().unwrap_or(self.screen_center())));
        info!("session restarted");
    }

    /// Runs one render frame of `dt` session time against the latest gesture state.
    pub fn advance(
        &mut self,
        dt: Duration,
        gesture: &GestureState,
        projector: &dyn Projector,
        sink: &mut impl FrameSink,
    ) -> Option<ShotOutcome> {
        self.clock += dt;
        let now = self.clock;

        let fired = self.ingest(gesture, now);
        self.trigger.tick(now);

        for event in self.registry.tick(now, dt.as_secs_f32()) {
            forward(event, sink);
        }

        let raw_aim = self.aim_to_screen(gesture.aim_point);
        let aim = if gesture.hand_present && gesture.is_aiming {
            self.acquire(raw_aim, projector, sink)
        } else {
            self.clear_lock();
            raw_aim
        };
        let crosshair = self.crosshair.update(aim);

        let shot = fired.then(|| self.resolve_shot(now, aim, projector, sink));

        for target in self.registry.targets() {
            sink.update_transform(
                target.id,
                target.position,
                target.rotation,
                target.spawn_scale,
            );
        }
        sink.show(&self.hud(crosshair));

        shot
    }

    /// Places a target at a fixed world position, outside the random placement.
    pub fn spawn_target_at(&mut self, origin: Vec3, sink: &mut impl FrameSink) -> Option<TargetId> {
        let target = self.registry.spawn_at(origin, self.clock)?;
        sink.spawn_entity(&visual(target));
        Some(target.id)
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            score: self.board.snapshot(),
            last_hit_at: self.board.last_hit_at(),
            locked_target: self.locked,
            was_locked: self.was_locked,
            is_shooting: self.trigger.is_shooting(self.clock),
            shooting_until: self.trigger.shooting_until(),
            trigger: self.trigger.state(),
        }
    }

    pub fn now(&self) -> Duration {
        self.clock
    }

    pub fn targets(&self) -> &[Target] {
        self.registry.targets()
    }

    pub fn tuning(&self) -> &GameTuning {
        &self.tuning
    }

    /// Feeds a new detection sample to the trigger. Returns true when it fired.
    fn ingest(&mut self, gesture: &GestureState, now: Duration) -> bool {
        let lost = gesture.losses != self.last_losses
            || (!gesture.hand_present && self.gesture.hand_present);
        self.last_losses = gesture.losses;
        if lost {
            self.on_tracking_lost();
        }

        let mut fired = false;
        if gesture.seq != self.last_seq {
            self.last_seq = gesture.seq;
            if gesture.hand_present {
                fired = self
                    .trigger
                    .on_sample(gesture.is_aiming, gesture.is_thumb_up, now);
            }
        }

        self.gesture = *gesture;
        fired
    }

    fn on_tracking_lost(&mut self) {
        self.trigger.on_tracking_lost();
        self.clear_lock();
        debug!("tracking lost; lock and trigger cleared");
    }

    fn acquire(&mut self, aim: Vec2, projector: &dyn Projector, sink: &mut impl FrameSink) -> Vec2 {
        let cfg = self.magnet_config();
        let candidates = self
            .registry
            .targets()
            .iter()
            .map(|t| (t.id, projector.project_to_screen(t.position)));

        match magnet::select_candidate(aim, candidates, self.locked, cfg) {
            Some(candidate) => {
                if !self.was_locked || self.locked != Some(candidate.id) {
                    debug!(target_id = candidate.id, distance = candidate.distance, "lock acquired");
                }
                if !self.was_locked {
                    sink.play(AudioCue::LockAcquired);
                }
                self.locked = Some(candidate.id);
                self.was_locked = true;
                magnet::magnetize(aim, &candidate, cfg)
            }
            None => {
                self.clear_lock();
                aim
            }
        }
    }

    fn resolve_shot(
        &mut self,
        now: Duration,
        aim: Vec2,
        projector: &dyn Projector,
        sink: &mut impl FrameSink,
    ) -> ShotOutcome {
        sink.play(AudioCue::Shoot);

        let Some(target) = self.locked.and_then(|id| self.registry.get(id)).cloned() else {
            self.board.register_miss();
            sink.play(AudioCue::Miss);
            sink.miss_effect(projector.unproject_to_world(aim));
            info!(shots = self.board.snapshot().shots, "shot missed");
            return ShotOutcome::Miss;
        };

        let outcome = self.board.register_hit(now, target.point_value);
        self.remove_target(target.id, now, sink);

        let perfect = outcome.tier == HitTier::Perfect;
        sink.play(if perfect {
            AudioCue::PerfectHit
        } else {
            AudioCue::Hit
        });
        if outcome.combo > 1 {
            sink.play(AudioCue::Combo(outcome.combo));
        }
        sink.hit_effect(target.position, target.color, perfect);

        info!(
            target_id = target.id,
            combo = outcome.combo,
            points = outcome.points,
            score = self.board.snapshot().score,
            "target hit"
        );
        ShotOutcome::Hit {
            target_id: target.id,
            outcome,
        }
    }

    /// Removal and lock release happen together so no frame sees a lock on a missing target.
    fn remove_target(&mut self, id: TargetId, now: Duration, sink: &mut impl FrameSink) {
        if self.registry.remove(id, now).is_some() {
            sink.remove_entity(id);
        }
        if self.locked == Some(id) {
            self.clear_lock();
        }
    }

    fn clear_lock(&mut self) {
        self.locked = None;
        self.was_locked = false;
    }

    fn magnet_config(&self) -> MagnetConfig {
        MagnetConfig {
            capture_radius: self.tuning.aim.capture_radius,
            max_strength: self.tuning.aim.magnet_strength,
            hysteresis: self.tuning.aim.lock_hysteresis,
        }
    }

    /// Normalized camera coordinates to viewport pixels, mirrored for a selfie view.
    fn aim_to_screen(&self, point: Vec2) -> Vec2 {
        let screen = &self.tuning.screen;
        let x = if screen.mirror_x { 1.0 - point.x } else { point.x };
        Vec2::new(x * screen.width, point.y * screen.height)
    }

    fn screen_center(&self) -> Vec2 {
        Vec2::new(self.tuning.screen.width, self.tuning.screen.height) * 0.5
    }

    fn hud(&self, crosshair: Vec2) -> HudSnapshot {
        HudSnapshot {
            score: self.board.snapshot(),
            crosshair,
            locked_target: self.locked,
            is_aiming: self.gesture.hand_present && self.gesture.is_aiming,
            confidence: if self.gesture.hand_present {
                self.gesture.confidence
            } else {
                0.0
            },
            is_shooting: self.trigger.is_shooting(self.clock),
            trigger: self.trigger.state(),
        }
    }
}

fn cooldown(tuning: &GameTuning) -> Duration {
    seconds(tuning.aim.shoot_cooldown_seconds)
}

fn visual(target: &Target) -> TargetVisual {
    TargetVisual {
        id: target.id,
        position: target.position,
        rotation: target.rotation,
        scale: target.spawn_scale,
        color: target.color,
        points: target.point_value,
    }
}

fn forward(event: RegistryEvent, sink: &mut impl FrameSink) {
    match event {
        RegistryEvent::Spawned(target) => sink.spawn_entity(&visual(&target)),
        // Relocation keeps the entity; the renderer just snaps it to the new transform.
        RegistryEvent::Relocated(target) => sink.update_transform(
            target.id,
            target.position,
            target.rotation,
            target.spawn_scale,
        ),
        RegistryEvent::Removed { id } => sink.remove_entity(id),
    }
}
