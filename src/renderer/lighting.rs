use crate::renderer::commands::CommandRecorder;
use crate::renderer::culling::{CullingResults, LightType};
use crate::renderer::keywords::{set_keywords, LIGHTS_PER_OBJECT_KEYWORD};
use crate::renderer::lights::{LightTables, LightsUniform, MAX_DIRECTIONAL_LIGHTS, MAX_OTHER_LIGHTS};
use crate::renderer::shadows::Shadows;
use crate::settings::ShadowSettings;

const SAMPLE_NAME: &str = "Lighting";

pub const DIR_LIGHT_COUNT: &str = "_DirectionalLightCount";
pub const DIR_LIGHT_COLORS: &str = "_DirectionalLightColors";
pub const DIR_LIGHT_DIRECTIONS: &str = "_DirectionalLightDirections";
pub const DIR_LIGHT_SHADOW_DATA: &str = "_DirectionalLightShadowData";
pub const OTHER_LIGHT_COUNT: &str = "_OtherLightCount";
pub const OTHER_LIGHT_COLORS: &str = "_OtherLightColors";
pub const OTHER_LIGHT_POSITIONS: &str = "_OtherLightPositions";
pub const OTHER_LIGHT_DIRECTIONS: &str = "_OtherLightDirections";
pub const OTHER_LIGHT_SPOT_ANGLES: &str = "_OtherLightSpotAngles";
pub const OTHER_LIGHT_SHADOW_DATA: &str = "_OtherLightShadowData";

/// Classifies the frame's visible lights, reserves their shadows and
/// publishes the light tables.
#[derive(Debug, Clone, Default)]
pub struct Lighting {
    shadows: Shadows,
    tables: LightTables,
    light_index_map: Vec<i32>,
}

impl Lighting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shadows(&self) -> &Shadows {
        &self.shadows
    }

    pub fn tables(&self) -> &LightTables {
        &self.tables
    }

    /// Visible light index to compacted other-light index, -1 for lights the
    /// per-object lists must skip. Empty when per-object lighting is off.
    pub fn light_index_map(&self) -> &[i32] {
        &self.light_index_map
    }

    pub fn uniform(&self) -> LightsUniform {
        LightsUniform::from_tables(&self.tables)
    }

    pub fn setup<C, R>(
        &mut self,
        culling: &mut C,
        recorder: &mut R,
        shadow_settings: &ShadowSettings,
        use_lights_per_object: bool,
    ) where
        C: CullingResults + ?Sized,
        R: CommandRecorder + ?Sized,
    {
        recorder.begin_sample(SAMPLE_NAME);
        self.shadows.begin_frame(shadow_settings);
        self.setup_lights(culling, recorder, use_lights_per_object);
        self.shadows.render(&*culling, recorder);
        recorder.end_sample(SAMPLE_NAME);
    }

    pub fn cleanup<R: CommandRecorder + ?Sized>(&mut self, recorder: &mut R) {
        self.shadows.cleanup(recorder);
    }

    fn setup_lights<C, R>(&mut self, culling: &mut C, recorder: &mut R, use_lights_per_object: bool)
    where
        C: CullingResults + ?Sized,
        R: CommandRecorder + ?Sized,
    {
        self.tables.clear();
        self.light_index_map.clear();
        if use_lights_per_object {
            self.light_index_map
                .resize(culling.light_index_map_len().max(culling.visible_lights().len()), -1);
        }

        let mut dir_count = 0;
        let mut other_count = 0;
        let mut dropped = 0;
        for (index, light) in culling.visible_lights().iter().enumerate() {
            let mut new_index = -1;
            match light.light_type {
                LightType::Directional => {
                    if dir_count < MAX_DIRECTIONAL_LIGHTS {
                        let shadow = self.shadows.reserve_directional(&*culling, light, index);
                        self.tables.set_directional(dir_count, light, shadow);
                        dir_count += 1;
                    } else {
                        dropped += 1;
                    }
                }
                LightType::Point => {
                    if other_count < MAX_OTHER_LIGHTS {
                        new_index = other_count as i32;
                        let shadow = self.shadows.reserve_other(light);
                        self.tables.set_point(other_count, light, shadow);
                        other_count += 1;
                    } else {
                        dropped += 1;
                    }
                }
                LightType::Spot => {
                    if other_count < MAX_OTHER_LIGHTS {
                        new_index = other_count as i32;
                        let shadow = self.shadows.reserve_other(light);
                        self.tables.set_spot(other_count, light, shadow);
                        other_count += 1;
                    } else {
                        dropped += 1;
                    }
                }
                LightType::Area => {}
            }

            if let Some(slot) = self.light_index_map.get_mut(index) {
                *slot = new_index;
            }
        }
        self.tables.directional_count = dir_count;
        self.tables.other_count = other_count;

        if dropped > 0 {
            log::debug!("{} visible lights exceeded the light limits", dropped);
        }

        if use_lights_per_object {
            culling.set_light_index_map(&self.light_index_map);
            set_keywords(recorder, &[LIGHTS_PER_OBJECT_KEYWORD], Some(0));
        } else {
            set_keywords(recorder, &[LIGHTS_PER_OBJECT_KEYWORD], None);
        }

        let tables = &self.tables;
        recorder.set_global_int(DIR_LIGHT_COUNT, dir_count as i32);
        if dir_count > 0 {
            recorder.set_global_vector_array(DIR_LIGHT_COLORS, &tables.directional_colors);
            recorder.set_global_vector_array(DIR_LIGHT_DIRECTIONS, &tables.directional_directions);
            recorder.set_global_vector_array(DIR_LIGHT_SHADOW_DATA, &tables.directional_shadow_data);
        }

        recorder.set_global_int(OTHER_LIGHT_COUNT, other_count as i32);
        if other_count > 0 {
            recorder.set_global_vector_array(OTHER_LIGHT_COLORS, &tables.other_colors);
            recorder.set_global_vector_array(OTHER_LIGHT_POSITIONS, &tables.other_positions);
            recorder.set_global_vector_array(OTHER_LIGHT_DIRECTIONS, &tables.other_directions);
            recorder.set_global_vector_array(OTHER_LIGHT_SPOT_ANGLES, &tables.other_spot_angles);
            recorder.set_global_vector_array(OTHER_LIGHT_SHADOW_DATA, &tables.other_shadow_data);
        }
    }
}
