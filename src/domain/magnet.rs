// Magnetic target acquisition in screen space.

use crate::domain::targets::TargetId;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: TargetId,
    /// Projected target position in pixels.
    pub screen: Vec2,
    /// Pixel distance from the raw aim point.
    pub distance: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct MagnetConfig {
    pub capture_radius: f32,
    pub max_strength: f32,
    /// Pixels subtracted from the current lock's distance when ranking. Never widens the radius.
    pub hysteresis: f32,
}

/// Picks the closest target strictly inside the capture radius. The first of equal minima wins.
pub fn select_candidate<I>(
    aim: Vec2,
    targets: I,
    current: Option<TargetId>,
    cfg: MagnetConfig,
) -> Option<Candidate>
where
    I: IntoIterator<Item = (TargetId, Vec2)>,
{
    let mut best: Option<(f32, Candidate)> = None;

    for (id, screen) in targets {
        let distance = aim.distance(screen);
        if !distance.is_finite() || distance >= cfg.capture_radius {
            continue;
        }

        let rank = if current == Some(id) {
            distance - cfg.hysteresis.max(0.0)
        } else {
            distance
        };

        if best.is_none_or(|(best_rank, _)| rank < best_rank) {
            best = Some((
                rank,
                Candidate {
                    id,
                    screen,
                    distance,
                },
            ));
        }
    }

    best.map(|(_, candidate)| candidate)
}

/// Linear falloff: `max_strength` on top of the target, zero at the capture radius.
pub fn pull_strength(distance: f32, cfg: MagnetConfig) -> f32 {
    if cfg.capture_radius <= 0.0 || distance >= cfg.capture_radius {
        return 0.0;
    }
    cfg.max_strength * (1.0 - distance / cfg.capture_radius)
}

/// Aim point bent toward the candidate.
pub fn magnetize(aim: Vec2, candidate: &Candidate, cfg: MagnetConfig) -> Vec2 {
    aim + (candidate.screen - aim) * pull_strength(candidate.distance, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: MagnetConfig = MagnetConfig {
        capture_radius: 120.0,
        max_strength: 0.4,
        hysteresis: 0.0,
    };

    #[test]
    fn picks_the_closest_target_in_range() {
        let aim = Vec2::new(500.0, 300.0);
        let targets = [
            (1, Vec2::new(580.0, 300.0)),
            (2, Vec2::new(530.0, 300.0)),
            (3, Vec2::new(900.0, 300.0)),
        ];

        let candidate = select_candidate(aim, targets, None, CFG).unwrap();
        assert_eq!(candidate.id, 2);
        assert_eq!(candidate.distance, 30.0);
    }

    #[test]
    fn never_selects_at_or_beyond_the_radius() {
        let aim = Vec2::ZERO;
        let targets = [(1, Vec2::new(120.0, 0.0)), (2, Vec2::new(0.0, 200.0))];

        assert_eq!(select_candidate(aim, targets, None, CFG), None);
        assert!(select_candidate(aim, [(1, Vec2::new(119.9, 0.0))], None, CFG).is_some());
    }

    #[test]
    fn equal_distances_keep_the_first_found() {
        let aim = Vec2::ZERO;
        let targets = [(7, Vec2::new(50.0, 0.0)), (8, Vec2::new(-50.0, 0.0))];

        assert_eq!(select_candidate(aim, targets, None, CFG).unwrap().id, 7);
        // Without hysteresis the current lock gets no preference.
        assert_eq!(select_candidate(aim, targets, Some(8), CFG).unwrap().id, 7);
    }

    #[test]
    fn hysteresis_keeps_the_current_lock_when_close() {
        let cfg = MagnetConfig {
            hysteresis: 10.0,
            ..CFG
        };
        let aim = Vec2::ZERO;
        let targets = [(1, Vec2::new(45.0, 0.0)), (2, Vec2::new(-50.0, 0.0))];

        assert_eq!(select_candidate(aim, targets, Some(2), cfg).unwrap().id, 2);
        assert_eq!(select_candidate(aim, targets, None, cfg).unwrap().id, 1);
        // Stickiness never reaches past the radius.
        let far = [(2, Vec2::new(125.0, 0.0))];
        assert_eq!(select_candidate(aim, far, Some(2), cfg), None);
    }

    #[test]
    fn pull_fades_linearly_to_zero_at_the_radius() {
        assert_eq!(pull_strength(120.0, CFG), 0.0);
        assert_eq!(pull_strength(500.0, CFG), 0.0);
        assert!((pull_strength(60.0, CFG) - 0.2).abs() < 1e-6);
        assert!((pull_strength(0.001, CFG) - 0.4).abs() < 1e-4);
        assert_eq!(pull_strength(0.0, CFG), 0.4);
    }

    #[test]
    fn magnetize_moves_the_aim_toward_the_candidate() {
        let aim = Vec2::new(100.0, 100.0);
        let candidate = Candidate {
            id: 1,
            screen: Vec2::new(160.0, 100.0),
            distance: 60.0,
        };

        let pulled = magnetize(aim, &candidate, CFG);
        assert!((pulled - Vec2::new(112.0, 100.0)).length() < 1e-4);
    }
}
