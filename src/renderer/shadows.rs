use glam::Vec4;

use crate::renderer::atlas::{convert_to_atlas_matrix, AtlasLayout};
use crate::renderer::cascades::{
    atlas_size_vector, distance_fade, CascadeTables, DirectionalShadowsUniform,
    MAX_SHADOWED_DIRECTIONAL_LIGHTS,
};
use crate::renderer::commands::{
    CommandRecorder, LoadAction, ShadowDrawSettings, StoreAction, TemporaryTarget,
};
use crate::renderer::culling::{CullingResults, VisibleLight};
use crate::renderer::keywords::ShadowKeywords;
use crate::settings::ShadowSettings;

const SAMPLE_NAME: &str = "Shadows";

pub const DIR_SHADOW_ATLAS: &str = "_DirectionalShadowAtlas";
pub const DIR_SHADOW_MATRICES: &str = "_DirectionalShadowMatrices";
pub const CASCADE_COUNT: &str = "_CascadeCount";
pub const CASCADE_CULLING_SPHERES: &str = "_CascadeCullingSpheres";
pub const CASCADE_DATA: &str = "_CascadeData";
pub const SHADOW_ATLAS_SIZE: &str = "_ShadowAtlasSize";
pub const SHADOW_DISTANCE_FADE: &str = "_ShadowDistanceFade";

/// Per-light shadow record folded into the light tables.
///
/// A negative `strength` means the light only contributes through the baked
/// shadow mask; `mask_channel` is -1 without a mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowData {
    pub strength: f32,
    pub tile_offset: f32,
    pub normal_bias: f32,
    pub mask_channel: f32,
}

impl ShadowData {
    pub const NONE: Self = Self {
        strength: 0.0,
        tile_offset: 0.0,
        normal_bias: 0.0,
        mask_channel: -1.0,
    };

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.strength,
            self.tile_offset,
            self.normal_bias,
            self.mask_channel,
        )
    }

    pub fn has_realtime_shadow(&self) -> bool {
        self.strength > 0.0
    }
}

impl From<ShadowData> for Vec4 {
    fn from(data: ShadowData) -> Self {
        data.to_vec4()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ShadowedDirectionalLight {
    visible_light_index: usize,
    slope_scale_bias: f32,
    near_plane_offset: f32,
}

/// Which temporary atlas, if any, the current frame owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasAllocation {
    Placeholder,
    Atlas { size: u32, layout: AtlasLayout },
}

/// Directional shadow atlas for one camera.
///
/// Call order per frame: `begin_frame`, any number of reservations,
/// `render`, then `cleanup` once shading no longer samples the atlas.
#[derive(Debug, Clone, Default)]
pub struct Shadows {
    settings: ShadowSettings,
    shadowed: [Option<ShadowedDirectionalLight>; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    shadowed_count: usize,
    use_shadow_mask: bool,
    tables: CascadeTables,
    allocation: Option<AtlasAllocation>,
}

impl Shadows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self, settings: &ShadowSettings) {
        if self.allocation.is_some() {
            log::warn!("Previous frame never released its shadow atlas");
        }
        self.settings = *settings;
        self.shadowed = [None; MAX_SHADOWED_DIRECTIONAL_LIGHTS];
        self.shadowed_count = 0;
        self.use_shadow_mask = false;
        self.tables = CascadeTables::default();
        self.allocation = None;
    }

    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    pub fn shadowed_light_count(&self) -> usize {
        self.shadowed_count
    }

    pub fn uses_shadow_mask(&self) -> bool {
        self.use_shadow_mask
    }

    pub fn tables(&self) -> &CascadeTables {
        &self.tables
    }

    pub fn allocation(&self) -> Option<AtlasAllocation> {
        self.allocation
    }

    pub fn reserve_directional<C: CullingResults + ?Sized>(
        &mut self,
        culling: &C,
        light: &VisibleLight,
        visible_light_index: usize,
    ) -> ShadowData {
        let params = &light.shadow;
        if self.shadowed_count >= MAX_SHADOWED_DIRECTIONAL_LIGHTS {
            if params.casts_shadows() {
                log::debug!(
                    "Directional light {} dropped: {} shadowed lights already reserved",
                    visible_light_index,
                    MAX_SHADOWED_DIRECTIONAL_LIGHTS
                );
            }
            return ShadowData::NONE;
        }
        if !params.casts_shadows() {
            return ShadowData::NONE;
        }

        let mut mask_channel = -1.0;
        if params.baking.uses_shadow_mask() {
            self.use_shadow_mask = true;
            mask_channel = params.baking.occlusion_mask_channel as f32;
        }

        if culling.shadow_caster_bounds(visible_light_index).is_none() {
            return ShadowData {
                strength: -params.strength,
                tile_offset: 0.0,
                normal_bias: 0.0,
                mask_channel,
            };
        }

        let index = self.shadowed_count;
        self.shadowed[index] = Some(ShadowedDirectionalLight {
            visible_light_index,
            slope_scale_bias: params.slope_bias,
            near_plane_offset: params.near_plane,
        });
        self.shadowed_count += 1;

        ShadowData {
            strength: params.strength,
            tile_offset: (self.settings.directional.cascade_count as usize * index) as f32,
            normal_bias: params.normal_bias,
            mask_channel,
        }
    }

    /// Point and spot lights never get an atlas tile; only their baked
    /// shadow mask is forwarded.
    pub fn reserve_other(&mut self, light: &VisibleLight) -> ShadowData {
        let params = &light.shadow;
        if params.casts_shadows() && params.baking.uses_shadow_mask() {
            self.use_shadow_mask = true;
            return ShadowData {
                strength: params.strength,
                tile_offset: 0.0,
                normal_bias: 0.0,
                mask_channel: params.baking.occlusion_mask_channel as f32,
            };
        }
        ShadowData::NONE
    }

    pub fn render<C, R>(&mut self, culling: &C, recorder: &mut R)
    where
        C: CullingResults + ?Sized,
        R: CommandRecorder + ?Sized,
    {
        if self.shadowed_count > 0 {
            self.render_directional_shadows(culling, recorder);
        } else {
            // The shading pass samples the atlas unconditionally.
            recorder.get_temporary_target(DIR_SHADOW_ATLAS, TemporaryTarget::shadow_map(1));
            self.allocation = Some(AtlasAllocation::Placeholder);
        }

        recorder.begin_sample(SAMPLE_NAME);
        ShadowKeywords::select(&self.settings, self.use_shadow_mask).apply(recorder);
        recorder.end_sample(SAMPLE_NAME);
    }

    pub fn cleanup<R: CommandRecorder + ?Sized>(&mut self, recorder: &mut R) {
        match self.allocation.take() {
            Some(_) => recorder.release_temporary_target(DIR_SHADOW_ATLAS),
            None => log::debug!("Shadow cleanup without a rendered atlas, nothing to release"),
        }
    }

    /// GPU-layout copy of the tables published by the last `render`.
    pub fn uniform(&self) -> DirectionalShadowsUniform {
        DirectionalShadowsUniform::from_tables(
            &self.tables,
            &self.settings,
            self.settings.directional.cascade_count,
        )
    }

    fn render_directional_shadows<C, R>(&mut self, culling: &C, recorder: &mut R)
    where
        C: CullingResults + ?Sized,
        R: CommandRecorder + ?Sized,
    {
        let atlas_size = self.settings.directional.atlas_size.pixels();
        recorder.get_temporary_target(DIR_SHADOW_ATLAS, TemporaryTarget::shadow_map(atlas_size));
        recorder.set_render_target(DIR_SHADOW_ATLAS, LoadAction::DontCare, StoreAction::Store);
        recorder.clear_render_target(true, false);
        recorder.begin_sample(SAMPLE_NAME);

        let cascade_count = self.settings.directional.cascade_count;
        let tiles = self.shadowed_count as u32 * cascade_count;
        let layout = AtlasLayout::new(tiles, atlas_size);
        self.allocation = Some(AtlasAllocation::Atlas {
            size: atlas_size,
            layout,
        });
        log::debug!(
            "Shadow atlas {}px: {} lights x {} cascades in a {}x{} grid of {}px tiles",
            atlas_size,
            self.shadowed_count,
            cascade_count,
            layout.split,
            layout.split,
            layout.tile_size
        );

        for index in 0..self.shadowed_count {
            self.render_directional_light(culling, recorder, index, &layout);
        }

        let matrices = self.tables.flattened_matrices();
        recorder.set_global_int(CASCADE_COUNT, cascade_count as i32);
        recorder.set_global_vector_array(CASCADE_CULLING_SPHERES, self.tables.culling_spheres());
        recorder.set_global_matrix_array(DIR_SHADOW_MATRICES, &matrices);
        recorder.set_global_vector_array(CASCADE_DATA, self.tables.cascade_data());
        recorder.set_global_vector(SHADOW_DISTANCE_FADE, distance_fade(&self.settings));
        recorder.set_global_vector(SHADOW_ATLAS_SIZE, atlas_size_vector(atlas_size));
        recorder.end_sample(SAMPLE_NAME);
    }

    fn render_directional_light<C, R>(
        &mut self,
        culling: &C,
        recorder: &mut R,
        index: usize,
        layout: &AtlasLayout,
    ) where
        C: CullingResults + ?Sized,
        R: CommandRecorder + ?Sized,
    {
        let Some(light) = self.shadowed[index] else {
            return;
        };
        let cascade_count = self.settings.directional.cascade_count as usize;
        let ratios = self.settings.directional.cascade_ratios();
        let filter = self.settings.directional.filter.ordinal();
        let conventions = recorder.conventions();
        let tile_offset = index * cascade_count;

        for cascade in 0..cascade_count {
            let Some(split) = culling.compute_directional_shadow_matrices_and_culling_primitives(
                light.visible_light_index,
                cascade,
                cascade_count,
                ratios,
                layout.tile_size,
                light.near_plane_offset,
            ) else {
                log::warn!(
                    "No shadow matrices for light {} cascade {}, skipping tile",
                    light.visible_light_index,
                    cascade
                );
                continue;
            };

            if index == 0 {
                self.tables.set_cascade_data(
                    cascade,
                    split.split_data.culling_sphere,
                    layout.tile_size as f32,
                    filter,
                );
            }

            let tile_index = (tile_offset + cascade) as u32;
            recorder.set_viewport(layout.tile_viewport(tile_index));
            self.tables.set_matrix(
                index,
                cascade,
                convert_to_atlas_matrix(
                    split.projection * split.view,
                    layout.tile_offset(tile_index),
                    layout.split,
                    conventions,
                ),
            );

            recorder.set_view_projection(split.view, split.projection);
            recorder.set_depth_bias(wgpu::DepthBiasState {
                constant: 0,
                slope_scale: light.slope_scale_bias,
                clamp: 0.0,
            });
            recorder.draw_shadows(&ShadowDrawSettings {
                visible_light_index: light.visible_light_index,
                split_data: split.split_data,
            });
            recorder.set_depth_bias(wgpu::DepthBiasState::default());
        }
    }
}
