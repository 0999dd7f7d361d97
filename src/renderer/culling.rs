use glam::{Mat4, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Directional,
    Point,
    Spot,
    /// Baked-only area lights. Visible to culling, ignored by realtime lighting.
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightShadows {
    #[default]
    None,
    Hard,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightmapBakeType {
    #[default]
    Realtime,
    Mixed,
    Baked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MixedLightingMode {
    #[default]
    IndirectOnly,
    Shadowmask,
    Subtractive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBakingOutput {
    pub lightmap_bake_type: LightmapBakeType,
    pub mixed_lighting_mode: MixedLightingMode,
    /// Shadow-mask texture channel (0-3) or -1 when none was assigned.
    pub occlusion_mask_channel: i32,
}

impl Default for LightBakingOutput {
    fn default() -> Self {
        Self {
            lightmap_bake_type: LightmapBakeType::Realtime,
            mixed_lighting_mode: MixedLightingMode::IndirectOnly,
            occlusion_mask_channel: -1,
        }
    }
}

impl LightBakingOutput {
    pub fn shadow_mask(channel: i32) -> Self {
        Self {
            lightmap_bake_type: LightmapBakeType::Mixed,
            mixed_lighting_mode: MixedLightingMode::Shadowmask,
            occlusion_mask_channel: channel,
        }
    }

    pub fn uses_shadow_mask(&self) -> bool {
        self.lightmap_bake_type == LightmapBakeType::Mixed
            && self.mixed_lighting_mode == MixedLightingMode::Shadowmask
    }
}

/// Per-light shadow authoring values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightShadowParams {
    pub shadows: LightShadows,
    pub strength: f32,
    pub slope_bias: f32,
    pub normal_bias: f32,
    pub near_plane: f32,
    pub baking: LightBakingOutput,
}

impl Default for LightShadowParams {
    fn default() -> Self {
        Self {
            shadows: LightShadows::None,
            strength: 1.0,
            slope_bias: 0.05,
            normal_bias: 0.4,
            near_plane: 0.2,
            baking: LightBakingOutput::default(),
        }
    }
}

impl LightShadowParams {
    pub fn casts_shadows(&self) -> bool {
        self.shadows != LightShadows::None && self.strength > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleLight {
    pub light_type: LightType,
    /// Colour premultiplied by intensity.
    pub final_color: Vec4,
    pub local_to_world: Mat4,
    pub range: f32,
    /// Full outer cone angle in degrees.
    pub spot_angle: f32,
    /// Full inner cone angle in degrees.
    pub inner_spot_angle: f32,
    pub shadow: LightShadowParams,
}

impl VisibleLight {
    /// Direction the light travels towards, i.e. the negated local +Z axis.
    pub fn direction(&self) -> Vec4 {
        -self.local_to_world.z_axis
    }

    pub fn position(&self) -> Vec3 {
        self.local_to_world.w_axis.truncate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Bounds {
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn encapsulate(&mut self, other: &Bounds) {
        *self = Bounds::from_min_max(self.min().min(other.min()), self.max().max(other.max()));
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min(), self.max());
        closest.distance_squared(center) <= radius * radius
    }
}

/// Split geometry used to cull casters for one cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSplitData {
    /// xyz centre, w radius.
    pub culling_sphere: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalShadowSplit {
    pub view: Mat4,
    /// Projection in GL clip conventions (depth in [-1, 1]).
    pub projection: Mat4,
    pub split_data: ShadowSplitData,
}

/// Everything the lighting and shadow code needs from the culling pass.
pub trait CullingResults {
    fn visible_lights(&self) -> &[VisibleLight];

    /// World bounds of the casters a light affects within the max shadow
    /// distance, or `None` when it has none.
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds>;

    #[allow(clippy::too_many_arguments)]
    fn compute_directional_shadow_matrices_and_culling_primitives(
        &self,
        visible_light_index: usize,
        cascade_index: usize,
        cascade_count: usize,
        cascade_ratios: Vec3,
        tile_size: u32,
        near_plane_offset: f32,
    ) -> Option<DirectionalShadowSplit>;

    /// Length of the per-object light index map. Can exceed the visible light
    /// count.
    fn light_index_map_len(&self) -> usize {
        self.visible_lights().len()
    }

    fn set_light_index_map(&mut self, map: &[i32]);
}
