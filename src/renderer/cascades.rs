use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::settings::{ShadowSettings, MAX_CASCADES};

pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;

/// Per-frame tables the shading pass samples the atlas with.
///
/// Matrices are addressed `[reservation][cascade]`; culling spheres and
/// cascade data are shared by every light.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeTables {
    matrices: [[Mat4; MAX_CASCADES]; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    culling_spheres: [Vec4; MAX_CASCADES],
    cascade_data: [Vec4; MAX_CASCADES],
}

impl Default for CascadeTables {
    fn default() -> Self {
        Self {
            matrices: [[Mat4::IDENTITY; MAX_CASCADES]; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
            culling_spheres: [Vec4::ZERO; MAX_CASCADES],
            cascade_data: [Vec4::ZERO; MAX_CASCADES],
        }
    }
}

impl CascadeTables {
    pub fn matrix(&self, light: usize, cascade: usize) -> Option<Mat4> {
        self.matrices.get(light)?.get(cascade).copied()
    }

    pub(crate) fn set_matrix(&mut self, light: usize, cascade: usize, matrix: Mat4) {
        if let Some(slot) = self
            .matrices
            .get_mut(light)
            .and_then(|row| row.get_mut(cascade))
        {
            *slot = matrix;
        }
    }

    /// Stores the culling sphere of `index` shrunk by the filter footprint,
    /// with its squared radius in `w`.
    pub(crate) fn set_cascade_data(
        &mut self,
        index: usize,
        culling_sphere: Vec4,
        tile_size: f32,
        filter_ordinal: u32,
    ) {
        if index >= MAX_CASCADES {
            return;
        }
        let texel_size = 2.0 * culling_sphere.w / tile_size;
        let filter_size = texel_size * (filter_ordinal as f32 + 1.0);
        let radius = culling_sphere.w - filter_size;
        let radius_sq = radius * radius;

        self.culling_spheres[index] = culling_sphere.truncate().extend(radius_sq);
        self.cascade_data[index] = Vec4::new(
            1.0 / radius_sq,
            filter_size * std::f32::consts::SQRT_2,
            0.0,
            0.0,
        );
    }

    pub fn culling_spheres(&self) -> &[Vec4; MAX_CASCADES] {
        &self.culling_spheres
    }

    pub fn cascade_data(&self) -> &[Vec4; MAX_CASCADES] {
        &self.cascade_data
    }

    /// Light-major flattening used by `_DirectionalShadowMatrices`.
    pub fn flattened_matrices(&self) -> [Mat4; MAX_CASCADES * MAX_SHADOWED_DIRECTIONAL_LIGHTS] {
        let mut flat = [Mat4::IDENTITY; MAX_CASCADES * MAX_SHADOWED_DIRECTIONAL_LIGHTS];
        for (dst, src) in flat.iter_mut().zip(self.matrices.iter().flatten()) {
            *dst = *src;
        }
        flat
    }
}

/// `(1/maxDistance, 1/distanceFade, 1/(1 - f^2))` with `f = 1 - cascadeFade`,
/// so the shader fades without dividing.
pub fn distance_fade(settings: &ShadowSettings) -> Vec4 {
    let f = 1.0 - settings.directional.cascade_fade;
    Vec4::new(
        1.0 / settings.max_distance,
        1.0 / settings.distance_fade,
        1.0 / (1.0 - f * f),
        0.0,
    )
}

pub fn atlas_size_vector(atlas_size: u32) -> Vec4 {
    let size = atlas_size as f32;
    Vec4::new(size, 1.0 / size, 0.0, 0.0)
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct DirectionalShadowsUniform {
    pub matrices: [[[f32; 4]; 4]; MAX_CASCADES * MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    pub culling_spheres: [[f32; 4]; MAX_CASCADES],
    pub cascade_data: [[f32; 4]; MAX_CASCADES],
    pub distance_fade: [f32; 4],
    pub atlas_size: [f32; 4],
    pub cascade_count: [u32; 4],
}

impl DirectionalShadowsUniform {
    pub fn from_tables(
        tables: &CascadeTables,
        settings: &ShadowSettings,
        cascade_count: u32,
    ) -> Self {
        let mut uniform = Self::zeroed();
        for (dst, src) in uniform.matrices.iter_mut().zip(tables.flattened_matrices()) {
            *dst = src.to_cols_array_2d();
        }
        for (dst, src) in uniform
            .culling_spheres
            .iter_mut()
            .zip(tables.culling_spheres())
        {
            *dst = src.to_array();
        }
        for (dst, src) in uniform.cascade_data.iter_mut().zip(tables.cascade_data()) {
            *dst = src.to_array();
        }
        uniform.distance_fade = distance_fade(settings).to_array();
        uniform.atlas_size = atlas_size_vector(settings.directional.atlas_size.pixels()).to_array();
        uniform.cascade_count[0] = cascade_count;
        uniform
    }
}
