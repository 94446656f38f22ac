// Exponential smoothing for aim points.
//
// Two instances run at different rates: one per detection cycle on the raw fingertip, one per
// render frame on the displayed crosshair.

use glam::Vec2;

#[derive(Debug, Clone, Copy)]
pub struct Smoother {
    factor: f32,
    value: Option<Vec2>,
}

impl Smoother {
    pub fn new(factor: f32) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            value: None,
        }
    }

    /// Moves the state `factor` of the way toward `target`. The first sample is taken as-is.
    pub fn update(&mut self, target: Vec2) -> Vec2 {
        if !target.is_finite() {
            return self.value.unwrap_or(target);
        }
        let next = match self.value {
            Some(current) => current + (target - current) * self.factor,
            None => target,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<Vec2> {
        self.value
    }

    /// Forgets the state so the next sample is taken as-is.
    pub fn clear(&mut self) {
        self.value = None;
    }
}
