// Target registry: placement, drift, relocation and top-up of the live target field.
//
// The registry only knows logical targets. Renderers learn about them through the
// `RegistryEvent`s returned from each call and keep their own visuals keyed by id.

use crate::domain::tuning::{TargetKind, TargetTuning, seconds};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;
use std::time::Duration;
use tracing::{debug, trace};

pub type TargetId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub id: TargetId,
    /// Displayed position: origin plus the local bob.
    pub position: Vec3,
    /// Drifting anchor point.
    pub origin: Vec3,
    pub drift_velocity: Vec3,
    /// Angular velocity per axis, radians per second.
    pub spin: Vec3,
    pub rotation: Vec3,
    pub float_phase: f32,
    pub amplitude: f32,
    pub frequency: f32,
    pub color: u32,
    pub point_value: u32,
    /// Session time of the last (re)placement; drives relocation.
    pub created_at: Duration,
    pub spawn_scale: f32,
}

impl Target {
    fn bob_offset(&self, now: Duration) -> Vec3 {
        let t = now.as_secs_f32();
        Vec3::new(
            0.0,
            (t * self.frequency + self.float_phase).sin() * self.amplitude,
            0.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    Spawned(Target),
    Relocated(Target),
    Removed { id: TargetId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnReason {
    Startup,
    TopUp,
    Respawn,
}

#[derive(Debug, Clone, Copy)]
struct PendingSpawn {
    due: Duration,
    reason: SpawnReason,
}

pub struct TargetRegistry {
    tuning: TargetTuning,
    rng: ChaCha8Rng,
    targets: Vec<Target>,
    pending: Vec<PendingSpawn>,
    next_id: TargetId,
}

impl TargetRegistry {
    pub fn new(tuning: TargetTuning, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            tuning,
            rng,
            targets: Vec::new(),
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Clears the field and queues a staggered fill starting at `now`.
    pub fn start(&mut self, now: Duration) -> Vec<RegistryEvent> {
        let events = self
            .targets
            .drain(..)
            .map(|t| RegistryEvent::Removed { id: t.id })
            .collect();
        self.pending.clear();

        let stagger = seconds(self.tuning.startup_stagger_seconds);
        for i in 0..self.tuning.max_count {
            self.pending.push(PendingSpawn {
                due: now + stagger * i as u32,
                reason: SpawnReason::Startup,
            });
        }
        events
    }

    /// Advances drift, bobbing, spin, spawn ramps, relocation and pending spawns by one frame.
    pub fn tick(&mut self, now: Duration, dt: f32) -> Vec<RegistryEvent> {
        let mut events = Vec::new();

        self.spawn_due(now, &mut events);
        self.top_up(now);

        let lifetime = seconds(self.tuning.lifetime_seconds);
        let ramp_rate = if self.tuning.spawn_ramp_seconds > 0.0 {
            1.0 / self.tuning.spawn_ramp_seconds
        } else {
            f32::INFINITY
        };

        let (min, max) = (self.tuning.world_min, self.tuning.world_max);
        for index in 0..self.targets.len() {
            let expired = now.saturating_sub(self.targets[index].created_at) > lifetime;
            if expired {
                self.relocate(index, now);
            }

            let target = &mut self.targets[index];
            target.origin += target.drift_velocity * dt;
            reflect(&mut target.origin, &mut target.drift_velocity, min, max);
            target.position = target.origin + target.bob_offset(now);
            target.rotation += target.spin * dt;
            target.spawn_scale = (target.spawn_scale + ramp_rate * dt).min(1.0);

            if expired {
                events.push(RegistryEvent::Relocated(target.clone()));
            }
        }

        events
    }

    /// Removes a target and schedules its replacement after the hit delay.
    pub fn remove(&mut self, id: TargetId, now: Duration) -> Option<Target> {
        let index = self.targets.iter().position(|t| t.id == id)?;
        let removed = self.targets.swap_remove(index);

        let delay = seconds(self.tuning.hit_respawn_delay_seconds);
        self.pending.push(PendingSpawn {
            due: now + delay,
            reason: SpawnReason::Respawn,
        });
        debug!(target_id = id, "target removed");
        Some(removed)
    }

    /// Places a target at a fixed origin, bypassing the random draw. Respects `max_count`.
    pub fn spawn_at(&mut self, origin: Vec3, now: Duration) -> Option<&Target> {
        if self.targets.len() + self.pending.len() >= self.tuning.max_count {
            if self.pending.is_empty() {
                return None;
            }
            // Give up a queued slot rather than exceed capacity.
            self.pending.pop();
        }
        let mut target = self.roll_target(now);
        target.origin = origin;
        target.position = origin + target.bob_offset(now);
        self.targets.push(target);
        self.targets.last()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.get(id).is_some()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn spawn_due(&mut self, now: Duration, events: &mut Vec<RegistryEvent>) {
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].due > now {
                index += 1;
                continue;
            }
            let spawn = self.pending.swap_remove(index);
            if self.targets.len() >= self.tuning.max_count {
                continue;
            }
            let target = self.roll_target(now);
            debug!(target_id = target.id, reason = ?spawn.reason, "target spawned");
            events.push(RegistryEvent::Spawned(target.clone()));
            self.targets.push(target);
        }
    }

    fn top_up(&mut self, now: Duration) {
        let missing = self
            .tuning
            .max_count
            .saturating_sub(self.targets.len() + self.pending.len());
        for _ in 0..missing {
            self.pending.push(PendingSpawn {
                due: now,
                reason: SpawnReason::TopUp,
            });
        }
    }

    fn roll_target(&mut self, now: Duration) -> Target {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let kind = self.pick_kind();
        let origin = self.place();
        let float_phase = self.rng.gen_range(0.0..TAU);
        let amplitude = self.sample(self.tuning.bob_amplitude);
        let frequency = self.sample(self.tuning.bob_frequency);
        let drift_velocity = self.roll_drift();
        let max_spin = self.tuning.max_spin.abs();
        let spin = Vec3::new(
            self.sample((-max_spin, max_spin)),
            self.sample((-max_spin, max_spin)),
            self.sample((-max_spin, max_spin)),
        );

        let mut target = Target {
            id,
            position: origin,
            origin,
            drift_velocity,
            spin,
            rotation: Vec3::ZERO,
            float_phase,
            amplitude,
            frequency,
            color: kind.color,
            point_value: kind.points,
            created_at: now,
            spawn_scale: self.tuning.spawn_scale,
        };
        target.position = origin + target.bob_offset(now);
        target
    }

    /// New origin, phase and drift for a target that outlived its lifetime. Identity and
    /// point value are kept.
    fn relocate(&mut self, index: usize, now: Duration) {
        let id = self.targets[index].id;
        let origin = self.place_excluding(Some(id));
        let float_phase = self.rng.gen_range(0.0..TAU);
        let drift_velocity = self.roll_drift();

        let target = &mut self.targets[index];
        target.origin = origin;
        target.float_phase = float_phase;
        target.drift_velocity = drift_velocity;
        target.created_at = now;
        target.spawn_scale = self.tuning.spawn_scale;
        target.position = origin + target.bob_offset(now);
        debug!(target_id = id, "target relocated");
    }

    fn place(&mut self) -> Vec3 {
        self.place_excluding(None)
    }

    /// Uniform draw inside the world bounds, redrawn while too close to another target. After
    /// `placement_attempts` draws the last one is accepted regardless.
    fn place_excluding(&mut self, exclude: Option<TargetId>) -> Vec3 {
        let min_separation = self.tuning.min_separation;
        let attempts = self.tuning.placement_attempts.max(1);

        let mut candidate = self.random_point();
        for attempt in 1..=attempts {
            let crowded = self
                .targets
                .iter()
                .filter(|t| Some(t.id) != exclude)
                .any(|t| t.origin.distance(candidate) < min_separation);
            if !crowded {
                return candidate;
            }
            if attempt == attempts {
                trace!(attempts, "placement accepted with overlap");
                break;
            }
            candidate = self.random_point();
        }
        candidate
    }

    fn random_point(&mut self) -> Vec3 {
        let (min, max) = (self.tuning.world_min, self.tuning.world_max);
        Vec3::new(
            self.sample((min.x, max.x)),
            self.sample((min.y, max.y)),
            self.sample((min.z, max.z)),
        )
    }

    /// Drift in the screen plane with a random heading.
    fn roll_drift(&mut self) -> Vec3 {
        let heading = self.rng.gen_range(0.0..TAU);
        let speed = self.sample(self.tuning.drift_speed);
        Vec3::new(heading.cos() * speed, heading.sin() * speed, 0.0)
    }

    fn pick_kind(&mut self) -> TargetKind {
        if self.tuning.kinds.is_empty() {
            return TargetKind {
                color: 0xffffff,
                points: 100,
            };
        }
        let index = self.rng.gen_range(0..self.tuning.kinds.len());
        self.tuning.kinds[index]
    }

    /// Uniform sample in `[lo, hi)`; collapses to `lo` for empty ranges.
    fn sample(&mut self, (lo, hi): (f32, f32)) -> f32 {
        if hi > lo { self.rng.gen_range(lo..hi) } else { lo }
    }
}

/// Bounces a point off the world box: the offending velocity component flips and the position is
/// clamped back inside.
fn reflect(position: &mut Vec3, velocity: &mut Vec3, min: Vec3, max: Vec3) {
    for axis in 0..3 {
        if position[axis] < min[axis] {
            position[axis] = min[axis];
            velocity[axis] = velocity[axis].abs();
        } else if position[axis] > max[axis] {
            position[axis] = max[axis];
            velocity[axis] = -velocity[axis].abs();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn tuning() -> TargetTuning {
        TargetTuning {
            startup_stagger_seconds: 0.0,
            ..TargetTuning::default()
        }
    }

    fn filled(tuning: TargetTuning) -> TargetRegistry {
        let mut registry = TargetRegistry::new(tuning, Some(7));
        registry.start(ms(0));
        registry.tick(ms(0), 0.0);
        registry
    }

    #[test]
    fn startup_fill_is_staggered_and_bounded() {
        let mut registry = TargetRegistry::new(TargetTuning::default(), Some(1));
        registry.start(ms(0));

        let mut now = ms(0);
        let mut seen = Vec::new();
        for _ in 0..120 {
            registry.tick(now, FRAME);
            assert!(registry.len() + registry.pending_len() <= 5);
            seen.push(registry.len());
            now += ms(16);
        }

        assert_eq!(seen[0], 1);
        assert!(seen.contains(&3));
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn hit_removal_respawns_after_the_delay() {
        let mut registry = filled(tuning());
        assert_eq!(registry.len(), 5);
        let id = registry.targets()[0].id;

        let removed = registry.remove(id, ms(1_000)).unwrap();
        assert_eq!(removed.id, id);
        assert!(!registry.contains(id));

        registry.tick(ms(1_016), FRAME);
        assert_eq!(registry.len(), 4);
        registry.tick(ms(1_599), FRAME);
        assert_eq!(registry.len(), 4);

        let events = registry.tick(ms(1_600), FRAME);
        assert_eq!(registry.len(), 5);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, RegistryEvent::Spawned(t) if t.id != id))
        );
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut registry = filled(tuning());
        let mut now = ms(0);
        for round in 0..50u64 {
            if round % 3 == 0 {
                let id = registry.targets()[0].id;
                registry.remove(id, now);
            }
            registry.tick(now, FRAME);
            assert!(registry.len() <= 5);
            assert!(registry.len() + registry.pending_len() <= 5);
            now += ms(100);
        }
    }

    #[test]
    fn spawn_at_refuses_a_full_field() {
        let mut registry = filled(tuning());
        assert_eq!(registry.pending_len(), 0);
        assert!(registry.spawn_at(Vec3::ZERO, ms(0)).is_none());
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn expired_target_is_relocated_in_place() {
        let mut registry = filled(tuning());
        let before = registry.targets()[0].clone();

        let events = registry.tick(ms(8_100), FRAME);
        let after = registry.get(before.id).expect("relocated target keeps its id");

        assert!(events.contains(&RegistryEvent::Relocated(after.clone())));
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, RegistryEvent::Removed { .. } | RegistryEvent::Spawned(_)))
        );
        assert_eq!(after.point_value, before.point_value);
        assert_eq!(after.color, before.color);
        assert_eq!(after.created_at, ms(8_100));
        assert_ne!(after.origin, before.origin);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn drift_reflects_off_the_world_bounds() {
        let mut registry = TargetRegistry::new(
            TargetTuning {
                max_count: 1,
                bob_amplitude: (0.0, 0.0),
                ..tuning()
            },
            Some(3),
        );
        registry.spawn_at(Vec3::new(6.95, 0.0, 0.0), ms(0));
        registry.targets[0].drift_velocity = Vec3::new(1.0, 0.0, 0.0);

        registry.tick(ms(100), 0.1);
        let target = &registry.targets()[0];
        assert_eq!(target.origin.x, 7.0);
        assert_eq!(target.drift_velocity.x, -1.0);

        registry.tick(ms(200), 0.1);
        assert!((registry.targets()[0].origin.x - 6.9).abs() < 1e-5);
    }

    #[test]
    fn displayed_position_bobs_around_the_origin() {
        let mut registry = TargetRegistry::new(
            TargetTuning {
                max_count: 1,
                drift_speed: (0.0, 0.0),
                bob_amplitude: (0.5, 0.5),
                ..tuning()
            },
            Some(5),
        );
        registry.spawn_at(Vec3::ZERO, ms(0));
        for step in 1..=60u64 {
            registry.tick(ms(step * 16), FRAME);
            let target = &registry.targets()[0];
            assert_eq!(target.origin, Vec3::ZERO);
            assert!((target.position - target.origin).length() <= 0.5 + 1e-5);
        }
    }

    #[test]
    fn spawn_scale_ramps_to_full_size() {
        let mut registry = filled(tuning());
        assert!(registry.targets().iter().all(|t| t.spawn_scale < 0.1));

        let mut now = ms(0);
        for _ in 0..10 {
            now += ms(16);
            registry.tick(now, FRAME);
        }
        let partway = registry.targets()[0].spawn_scale;
        assert!(partway > 0.1 && partway < 1.0);

        for _ in 0..20 {
            now += ms(16);
            registry.tick(now, FRAME);
        }
        assert!(registry.targets().iter().all(|t| t.spawn_scale == 1.0));
    }

    #[test]
    fn placement_keeps_separation_when_there_is_room() {
        let registry = filled(tuning());
        let targets = registry.targets();
        for (i, a) in targets.iter().enumerate() {
            for b in &targets[i + 1..] {
                assert!(a.origin.distance(b.origin) >= 2.0);
            }
        }
    }

    #[test]
    fn placement_gives_up_after_bounded_attempts() {
        // A box far too small for the separation: every draw collides.
        let mut registry = TargetRegistry::new(
            TargetTuning {
                world_min: Vec3::splat(-0.1),
                world_max: Vec3::splat(0.1),
                ..tuning()
            },
            Some(11),
        );
        registry.start(ms(0));
        registry.tick(ms(0), 0.0);

        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn restart_clears_the_field() {
        let mut registry = filled(tuning());
        let ids: Vec<_> = registry.targets().iter().map(|t| t.id).collect();

        let events = registry.start(ms(5_000));
        assert!(registry.is_empty());
        assert_eq!(events.len(), ids.len());
        assert_eq!(registry.pending_len(), 5);
    }

    #[test]
    fn unbounded_lifetime_keeps_ticking() {
        let mut registry = filled(TargetTuning {
            lifetime_seconds: 1e30,
            ..tuning()
        });
        let ids: Vec<_> = registry.targets().iter().map(|t| t.id).collect();

        let events = registry.tick(ms(60_000), FRAME);
        assert!(events.is_empty());
        assert_eq!(registry.targets().iter().map(|t| t.id).collect::<Vec<_>>(), ids);
    }
}
