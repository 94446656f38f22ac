// Test-only fakes for the session and its drivers.

use super::types::GestureState;
use crate::domain::Projector;
use glam::{Vec2, Vec3};

/// Orthographic camera: 100 px per world unit, world origin at the center of a 1280x720 viewport.
pub struct FlatProjector;

impl Projector for FlatProjector {
    fn project_to_screen(&self, world: Vec3) -> Vec2 {
        Vec2::new(640.0 + world.x * 100.0, 360.0 - world.y * 100.0)
    }

    fn unproject_to_world(&self, screen: Vec2) -> Vec3 {
        Vec3::new((screen.x - 640.0) / 100.0, (360.0 - screen.y) / 100.0, 0.0)
    }
}

/// Hand-written detection output, one new sample per call.
#[derive(Default)]
pub struct GestureFeed {
    state: GestureState,
}

impl GestureFeed {
    pub fn aim(&mut self, point: Vec2, thumb_up: bool) -> GestureState {
        self.sample(point, true, thumb_up)
    }

    pub fn open(&mut self, point: Vec2) -> GestureState {
        self.sample(point, false, true)
    }

    pub fn lose(&mut self) -> GestureState {
        self.state.seq += 1;
        if self.state.hand_present {
            self.state.losses += 1;
        }
        self.state.hand_present = false;
        self.state.is_aiming = false;
        self.state.is_thumb_up = true;
        self.state.confidence = 0.0;
        self.state
    }

    /// Same state again, as the frame loop sees it between detection cycles.
    pub fn idle(&self) -> GestureState {
        self.state
    }

    fn sample(&mut self, point: Vec2, aiming: bool, thumb_up: bool) -> GestureState {
        self.state.seq += 1;
        self.state.hand_present = true;
        self.state.is_aiming = aiming;
        self.state.is_thumb_up = thumb_up;
        self.state.aim_point = point;
        self.state.confidence = if aiming { 1.0 } else { 0.4 };
        self.state
    }
}
