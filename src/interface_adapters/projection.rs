// Perspective camera used for acquisition when no external renderer supplies one.

use crate::domain::Projector;
use crate::domain::tuning::ScreenTuning;
use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

/// Camera on +Z looking at the origin, y up. Screen pixels have their origin top-left.
#[derive(Debug, Clone)]
pub struct PerspectiveProjector {
    view_proj: Mat4,
    inverse: Mat4,
    viewport: Vec2,
}

impl PerspectiveProjector {
    pub fn new(screen: &ScreenTuning) -> Self {
        let viewport = Vec2::new(screen.width.max(1.0), screen.height.max(1.0));
        let fov = screen.fov_y_degrees.clamp(1.0, 179.0).to_radians();
        let eye = Vec3::new(0.0, 0.0, screen.camera_distance.max(NEAR * 2.0));

        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(fov, viewport.x / viewport.y, NEAR, FAR);
        let view_proj = proj * view;

        Self {
            view_proj,
            inverse: view_proj.inverse(),
            viewport,
        }
    }

    fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        )
    }

    fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            screen.x / self.viewport.x * 2.0 - 1.0,
            1.0 - screen.y / self.viewport.y * 2.0,
        )
    }
}

impl Projector for PerspectiveProjector {
    /// Points behind the camera land at infinity and are never acquired.
    fn project_to_screen(&self, world: Vec3) -> Vec2 {
        let clip = self.view_proj * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return Vec2::splat(f32::INFINITY);
        }
        self.ndc_to_screen(clip.xy() / clip.w)
    }

    fn unproject_to_world(&self, screen: Vec2) -> Vec3 {
        let ndc = self.screen_to_ndc(screen);
        let near = self.inverse.project_point3(ndc.extend(0.0));
        let far = self.inverse.project_point3(ndc.extend(1.0));

        let dir = far - near;
        if dir.z.abs() <= f32::EPSILON {
            return near.with_z(0.0);
        }
        let t = -near.z / dir.z;
        near + dir * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projector() -> PerspectiveProjector {
        PerspectiveProjector::new(&ScreenTuning::default())
    }

    #[test]
    fn origin_lands_in_the_middle_of_the_viewport() {
        let screen = projector().project_to_screen(Vec3::ZERO);
        assert!((screen - Vec2::new(640.0, 360.0)).length() < 1e-3);
    }

    #[test]
    fn up_and_right_in_the_world_is_up_and_right_on_screen() {
        let p = projector();
        let screen = p.project_to_screen(Vec3::new(1.0, 1.0, 0.0));
        assert!(screen.x > 640.0);
        assert!(screen.y < 360.0);
    }

    #[test]
    fn nearer_targets_spread_further_from_the_center() {
        let p = projector();
        let far = p.project_to_screen(Vec3::new(1.0, 0.0, -2.0));
        let near = p.project_to_screen(Vec3::new(1.0, 0.0, 1.0));
        assert!(near.x > far.x);
    }

    #[test]
    fn unprojection_hits_the_target_plane() {
        let p = projector();
        let world = Vec3::new(-3.0, 2.0, 0.0);
        let back = p.unproject_to_world(p.project_to_screen(world));
        assert!((back - world).length() < 1e-2);
        assert!(back.z.abs() < 1e-3);
    }

    #[test]
    fn behind_the_camera_is_unreachable() {
        let screen = projector().project_to_screen(Vec3::new(0.0, 0.0, 20.0));
        assert!(!screen.is_finite());
    }
}
