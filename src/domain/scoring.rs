// Combo and score bookkeeping for one play session.

use crate::domain::tuning::{ScoringTuning, seconds};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HitTier {
    Normal,
    /// Combo at or above the perfect threshold. Only changes how the hit is presented.
    Perfect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitOutcome {
    pub combo: u32,
    pub points: u64,
    pub tier: HitTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSnapshot {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub hits: u32,
    pub shots: u32,
    /// Percentage of shots that hit; `None` until the first shot.
    pub accuracy: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Scoreboard {
    tuning: ScoringTuning,
    score: u64,
    combo: u32,
    max_combo: u32,
    hits: u32,
    shots: u32,
    accuracy: Option<u32>,
    last_hit_at: Option<Duration>,
}

impl Scoreboard {
    pub fn new(tuning: ScoringTuning) -> Self {
        Self {
            tuning,
            score: 0,
            combo: 1,
            max_combo: 1,
            hits: 0,
            shots: 0,
            accuracy: None,
            last_hit_at: None,
        }
    }

    /// Records a shot that struck a target worth `base_points`.
    pub fn register_hit(&mut self, now: Duration, base_points: u32) -> HitOutcome {
        let timeout = seconds(self.tuning.combo_timeout_seconds);
        let max_combo = self.tuning.max_combo.max(1);

        let streak = self
            .last_hit_at
            .is_some_and(|last| now.saturating_sub(last) < timeout);
        self.combo = if streak {
            (self.combo + 1).min(max_combo)
        } else {
            1
        };
        self.max_combo = self.max_combo.max(self.combo);
        self.last_hit_at = Some(now);

        let points = u64::from(base_points) * u64::from(self.combo);
        self.score += points;
        self.shots += 1;
        self.hits += 1;
        self.refresh_accuracy();

        let tier = if self.combo >= self.tuning.perfect_combo {
            HitTier::Perfect
        } else {
            HitTier::Normal
        };

        HitOutcome {
            combo: self.combo,
            points,
            tier,
        }
    }

    /// Records a shot with nothing locked. Breaks the streak.
    pub fn register_miss(&mut self) {
        self.combo = 1;
        self.shots += 1;
        self.refresh_accuracy();
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            combo: self.combo,
            max_combo: self.max_combo,
            hits: self.hits,
            shots: self.shots,
            accuracy: self.accuracy,
        }
    }

    pub fn last_hit_at(&self) -> Option<Duration> {
        self.last_hit_at
    }

    fn refresh_accuracy(&mut self) {
        if self.shots > 0 {
            let ratio = f64::from(self.hits) / f64::from(self.shots);
            self.accuracy = Some((ratio * 100.0).round() as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn first_hit_starts_at_combo_one() {
        let mut board = Scoreboard::new(ScoringTuning::default());
        let outcome = board.register_hit(ms(5_000), 100);

        assert_eq!(outcome.combo, 1);
        assert_eq!(outcome.points, 100);
        assert_eq!(outcome.tier, HitTier::Normal);
        assert_eq!(board.snapshot().score, 100);
    }

    #[test]
    fn quick_hits_build_the_combo_and_multiply_points() {
        let mut board = Scoreboard::new(ScoringTuning::default());
        board.register_hit(ms(0), 100);
        board.register_hit(ms(1_000), 100);
        board.register_hit(ms(2_000), 100);
        assert_eq!(board.snapshot().combo, 3);

        // 1500 ms after the previous hit keeps the streak.
        let outcome = board.register_hit(ms(3_500), 150);
        assert_eq!(outcome.combo, 4);
        assert_eq!(outcome.points, 600);
        assert_eq!(board.snapshot().score, 100 + 200 + 300 + 600);
    }

    #[test]
    fn slow_hit_resets_the_combo() {
        let mut board = Scoreboard::new(ScoringTuning::default());
        board.register_hit(ms(0), 100);
        board.register_hit(ms(1_000), 100);

        // Exactly at the timeout no longer counts as a streak.
        let outcome = board.register_hit(ms(3_000), 100);
        assert_eq!(outcome.combo, 1);
        assert_eq!(board.snapshot().max_combo, 2);
    }

    #[test]
    fn combo_caps_at_ten_and_turns_perfect_at_five() {
        let mut board = Scoreboard::new(ScoringTuning::default());
        let mut tiers = Vec::new();
        for i in 0..15 {
            let outcome = board.register_hit(ms(i * 500), 10);
            assert!((1..=10).contains(&outcome.combo));
            tiers.push(outcome.tier);
        }

        let snapshot = board.snapshot();
        assert_eq!(snapshot.combo, 10);
        assert_eq!(snapshot.max_combo, 10);
        assert_eq!(tiers[3], HitTier::Normal);
        assert_eq!(tiers[4], HitTier::Perfect);
    }

    #[test]
    fn miss_resets_combo_and_counts_the_shot() {
        let mut board = Scoreboard::new(ScoringTuning::default());
        board.register_hit(ms(0), 100);
        board.register_hit(ms(500), 100);
        board.register_miss();

        let snapshot = board.snapshot();
        assert_eq!(snapshot.combo, 1);
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.shots, 3);
        assert_eq!(snapshot.max_combo, 2);

        // The next quick hit does not resume the broken streak.
        let outcome = board.register_hit(ms(700), 100);
        assert_eq!(outcome.combo, 2);
    }

    #[test]
    fn accuracy_is_undefined_until_the_first_shot() {
        let mut board = Scoreboard::new(ScoringTuning::default());
        assert_eq!(board.snapshot().accuracy, None);

        board.register_miss();
        assert_eq!(board.snapshot().accuracy, Some(0));

        board.register_hit(ms(0), 100);
        board.register_hit(ms(100), 100);
        // 2 of 3
        assert_eq!(board.snapshot().accuracy, Some(67));
        assert!(board.snapshot().hits <= board.snapshot().shots);
    }

    #[test]
    fn negative_combo_timeout_never_chains() {
        let mut board = Scoreboard::new(ScoringTuning {
            combo_timeout_seconds: -1.0,
            ..ScoringTuning::default()
        });
        board.register_hit(ms(0), 100);
        let outcome = board.register_hit(ms(10), 100);

        assert_eq!(outcome.combo, 1);
        assert_eq!(board.snapshot().score, 200);
    }
}
