// scene/components.rs
// hecs components the culling pass reads lights and casters from

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::renderer::culling::{Bounds, LightShadowParams};

// ============================================================================
// Placement
// ============================================================================

/// Rigid world placement. Lights ignore scale.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    /// Pose whose local -Z axis points along `direction`.
    pub fn looking_along(translation: Vec3, direction: Vec3) -> Self {
        let rotation = Quat::from_rotation_arc(Vec3::NEG_Z, direction.try_normalize().unwrap_or(Vec3::NEG_Z));
        Self {
            translation,
            rotation,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

// ============================================================================
// Lighting Components
// ============================================================================

/// Directional light component
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Point light component
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
}

/// Spot light component, cone angles in degrees (full cone)
#[derive(Debug, Clone, Copy)]
pub struct SpotLight {
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub inner_angle: f32,
    pub outer_angle: f32,
}

/// Shadow settings of a light entity; lights without it cast no shadows.
#[derive(Debug, Clone, Copy)]
pub struct CastShadows(pub LightShadowParams);

// ============================================================================
// Caster Components
// ============================================================================

/// World-space bounds of a shadow-casting renderer
#[derive(Debug, Clone, Copy)]
pub struct ShadowCaster(pub Bounds);

pub(crate) fn final_color(color: Vec3, intensity: f32) -> Vec4 {
    (color * intensity).extend(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looking_along_points_forward_axis() {
        let direction = Vec3::new(1.0, -1.0, 0.0).normalize();
        let pose = Pose::looking_along(Vec3::ZERO, direction);
        let forward = -pose.matrix().z_axis.truncate();
        assert!(forward.abs_diff_eq(direction, 1e-5), "{forward:?}");
    }
}
