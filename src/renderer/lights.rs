use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::renderer::culling::VisibleLight;
use crate::renderer::shadows::ShadowData;

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_OTHER_LIGHTS: usize = 64;

/// Shader-visible light arrays for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LightTables {
    pub directional_count: usize,
    pub directional_colors: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    pub directional_directions: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    pub directional_shadow_data: [Vec4; MAX_DIRECTIONAL_LIGHTS],
    pub other_count: usize,
    pub other_colors: [Vec4; MAX_OTHER_LIGHTS],
    pub other_positions: [Vec4; MAX_OTHER_LIGHTS],
    pub other_directions: [Vec4; MAX_OTHER_LIGHTS],
    pub other_spot_angles: [Vec4; MAX_OTHER_LIGHTS],
    pub other_shadow_data: [Vec4; MAX_OTHER_LIGHTS],
}

impl Default for LightTables {
    fn default() -> Self {
        Self {
            directional_count: 0,
            directional_colors: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            directional_directions: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            directional_shadow_data: [Vec4::ZERO; MAX_DIRECTIONAL_LIGHTS],
            other_count: 0,
            other_colors: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_positions: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_directions: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_spot_angles: [Vec4::ZERO; MAX_OTHER_LIGHTS],
            other_shadow_data: [Vec4::ZERO; MAX_OTHER_LIGHTS],
        }
    }
}

impl LightTables {
    pub fn clear(&mut self) {
        self.directional_count = 0;
        self.other_count = 0;
    }

    pub(crate) fn set_directional(&mut self, index: usize, light: &VisibleLight, shadow: ShadowData) {
        self.directional_colors[index] = light.final_color;
        self.directional_directions[index] = light.direction();
        self.directional_shadow_data[index] = shadow.to_vec4();
    }

    pub(crate) fn set_point(&mut self, index: usize, light: &VisibleLight, shadow: ShadowData) {
        self.other_colors[index] = light.final_color;
        self.other_positions[index] = light.position().extend(inverse_range_sq(light.range));
        self.other_spot_angles[index] = Vec4::new(0.0, 1.0, 0.0, 0.0);
        self.other_shadow_data[index] = shadow.to_vec4();
    }

    pub(crate) fn set_spot(&mut self, index: usize, light: &VisibleLight, shadow: ShadowData) {
        self.other_colors[index] = light.final_color;
        self.other_positions[index] = light.position().extend(inverse_range_sq(light.range));
        self.other_directions[index] = light.direction();
        self.other_spot_angles[index] = spot_angles(light.inner_spot_angle, light.spot_angle);
        self.other_shadow_data[index] = shadow.to_vec4();
    }
}

fn inverse_range_sq(range: f32) -> f32 {
    1.0 / (range * range).max(0.00001)
}

/// Scale and offset turning `dot(spotDir, lightDir)` into a 0..1 cone
/// attenuation. Angles are full cone angles in degrees.
pub fn spot_angles(inner_angle: f32, outer_angle: f32) -> Vec4 {
    let inner_cos = (0.5 * inner_angle).to_radians().cos();
    let outer_cos = (0.5 * outer_angle).to_radians().cos();
    let angle_range_inv = 1.0 / (inner_cos - outer_cos).max(0.001);
    Vec4::new(angle_range_inv, -outer_cos * angle_range_inv, 0.0, 0.0)
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct DirectionalLightRaw {
    pub color: [f32; 4],
    pub direction: [f32; 4],
    pub shadow_data: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct OtherLightRaw {
    pub color: [f32; 4],
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub spot_angles: [f32; 4],
    pub shadow_data: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LightsUniform {
    pub counts: [u32; 4],
    pub directionals: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
    pub others: [OtherLightRaw; MAX_OTHER_LIGHTS],
}

impl LightsUniform {
    pub fn from_tables(tables: &LightTables) -> Self {
        let mut uniform = Self::zeroed();

        let dir_count = tables.directional_count.min(MAX_DIRECTIONAL_LIGHTS);
        uniform.counts[0] = dir_count as u32;
        for (index, dst) in uniform.directionals.iter_mut().enumerate().take(dir_count) {
            *dst = DirectionalLightRaw {
                color: tables.directional_colors[index].to_array(),
                direction: tables.directional_directions[index].to_array(),
                shadow_data: tables.directional_shadow_data[index].to_array(),
            };
        }

        let other_count = tables.other_count.min(MAX_OTHER_LIGHTS);
        uniform.counts[1] = other_count as u32;
        for (index, dst) in uniform.others.iter_mut().enumerate().take(other_count) {
            *dst = OtherLightRaw {
                color: tables.other_colors[index].to_array(),
                position: tables.other_positions[index].to_array(),
                direction: tables.other_directions[index].to_array(),
                spot_angles: tables.other_spot_angles[index].to_array(),
                shadow_data: tables.other_shadow_data[index].to_array(),
            };
        }

        uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_angles_map_cone_edges_to_zero_and_one() {
        let angles = spot_angles(30.0, 60.0);
        let inner_cos = 15f32.to_radians().cos();
        let outer_cos = 30f32.to_radians().cos();

        let attenuation = |cos: f32| cos * angles.x + angles.y;
        assert!((attenuation(inner_cos) - 1.0).abs() < 1e-4);
        assert!(attenuation(outer_cos).abs() < 1e-4);
    }

    #[test]
    fn spot_angles_clamp_degenerate_cone() {
        let angles = spot_angles(45.0, 45.0);
        assert!((angles.x - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn inverse_range_avoids_division_by_zero() {
        assert_eq!(inverse_range_sq(0.0), 1.0 / 0.00001);
        assert!((inverse_range_sq(2.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn uniform_copies_only_counted_lights() {
        let mut tables = LightTables::default();
        tables.directional_count = 1;
        tables.directional_colors = [Vec4::ONE; MAX_DIRECTIONAL_LIGHTS];
        tables.other_count = 0;
        tables.other_colors[0] = Vec4::ONE;

        let uniform = LightsUniform::from_tables(&tables);

        assert_eq!(uniform.counts, [1, 0, 0, 0]);
        assert_eq!(uniform.directionals[0].color, [1.0; 4]);
        assert_eq!(uniform.directionals[1].color, [0.0; 4]);
        assert_eq!(uniform.others[0].color, [0.0; 4]);
    }

    #[test]
    fn lights_uniform_size() {
        assert_eq!(
            std::mem::size_of::<LightsUniform>(),
            16 + MAX_DIRECTIONAL_LIGHTS * 48 + MAX_OTHER_LIGHTS * 80
        );
    }
}
