use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const MAX_CASCADES: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub shadows: ShadowSettings,
    #[serde(default = "PipelineSettings::default_use_lights_per_object")]
    pub use_lights_per_object: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            shadows: ShadowSettings::default(),
            use_lights_per_object: Self::default_use_lights_per_object(),
        }
    }
}

impl PipelineSettings {
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<PipelineSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded pipeline settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default pipeline settings.",
                        path, err
                    );
                    PipelineSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Pipeline settings file {:?} not found. Using default settings.",
                    path
                );
                PipelineSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default pipeline settings.",
                    path, err
                );
                PipelineSettings::default()
            }
        }
    }

    pub fn validate(mut self) -> Self {
        self.shadows = self.shadows.validate();
        self
    }

    const fn default_use_lights_per_object() -> bool {
        true
    }
}

/// Shadow configuration shared by every camera rendered with the pipeline.
///
/// Values are validated once at load time; the per-frame code trusts them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    #[serde(default = "ShadowSettings::default_max_distance")]
    pub max_distance: f32,
    #[serde(default = "ShadowSettings::default_distance_fade")]
    pub distance_fade: f32,
    #[serde(default)]
    pub shadow_mask_mode: ShadowMaskMode,
    #[serde(default)]
    pub directional: DirectionalShadowSettings,
    #[serde(default)]
    pub other: OtherShadowSettings,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: Self::default_max_distance(),
            distance_fade: Self::default_distance_fade(),
            shadow_mask_mode: ShadowMaskMode::default(),
            directional: DirectionalShadowSettings::default(),
            other: OtherShadowSettings::default(),
        }
    }
}

impl ShadowSettings {
    const MIN_FRACTION: f32 = 0.001;

    pub fn validate(mut self) -> Self {
        if !(self.max_distance >= Self::MIN_FRACTION) {
            warn!(
                "Max shadow distance {} is too small. Using {} instead.",
                self.max_distance,
                Self::MIN_FRACTION
            );
            self.max_distance = Self::MIN_FRACTION;
        }

        self.distance_fade = clamp_fraction("Distance fade", self.distance_fade);

        let directional = &mut self.directional;
        if directional.cascade_count == 0 || directional.cascade_count as usize > MAX_CASCADES {
            let clamped = directional.cascade_count.clamp(1, MAX_CASCADES as u32);
            warn!(
                "Cascade count {} is outside 1..={}. Using {} instead.",
                directional.cascade_count, MAX_CASCADES, clamped
            );
            directional.cascade_count = clamped;
        }

        for ratio in directional.cascade_ratios.iter_mut() {
            if !(0.0..=1.0).contains(ratio) {
                let clamped = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
                warn!("Cascade ratio {} is outside [0, 1]. Using {}.", ratio, clamped);
                *ratio = clamped;
            }
        }

        directional.cascade_fade = clamp_fraction("Cascade fade", directional.cascade_fade);

        self
    }
}

fn clamp_fraction(name: &str, value: f32) -> f32 {
    if (ShadowSettings::MIN_FRACTION..=1.0).contains(&value) {
        return value;
    }
    let clamped = if value.is_nan() {
        1.0
    } else {
        value.clamp(ShadowSettings::MIN_FRACTION, 1.0)
    };
    warn!(
        "{} {} is outside [{}, 1]. Using {} instead.",
        name,
        value,
        ShadowSettings::MIN_FRACTION,
        clamped
    );
    clamped
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalShadowSettings {
    #[serde(default)]
    pub atlas_size: TextureSize,
    #[serde(default)]
    pub filter: FilterQuality,
    #[serde(default = "DirectionalShadowSettings::default_cascade_count")]
    pub cascade_count: u32,
    #[serde(default = "DirectionalShadowSettings::default_cascade_ratios")]
    pub cascade_ratios: [f32; 3],
    #[serde(default = "DirectionalShadowSettings::default_cascade_fade")]
    pub cascade_fade: f32,
    #[serde(default)]
    pub cascade_blend: CascadeBlendMode,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: TextureSize::default(),
            filter: FilterQuality::default(),
            cascade_count: Self::default_cascade_count(),
            cascade_ratios: Self::default_cascade_ratios(),
            cascade_fade: Self::default_cascade_fade(),
            cascade_blend: CascadeBlendMode::default(),
        }
    }
}

impl DirectionalShadowSettings {
    pub fn cascade_ratios(&self) -> Vec3 {
        Vec3::from_array(self.cascade_ratios)
    }

    const fn default_cascade_count() -> u32 {
        4
    }

    const fn default_cascade_ratios() -> [f32; 3] {
        [0.1, 0.25, 0.5]
    }

    const fn default_cascade_fade() -> f32 {
        0.1
    }
}

/// Atlas settings for point and spot lights. Only the baked shadow mask is
/// forwarded for those lights, so nothing reads these values yet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OtherShadowSettings {
    #[serde(default)]
    pub atlas_size: TextureSize,
    #[serde(default)]
    pub filter: FilterQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TextureSize {
    S256,
    S512,
    #[default]
    S1024,
    S2048,
    S4096,
    S8192,
}

impl TextureSize {
    pub const fn pixels(self) -> u32 {
        match self {
            TextureSize::S256 => 256,
            TextureSize::S512 => 512,
            TextureSize::S1024 => 1024,
            TextureSize::S2048 => 2048,
            TextureSize::S4096 => 4096,
            TextureSize::S8192 => 8192,
        }
    }
}

impl TryFrom<u32> for TextureSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            256 => Ok(TextureSize::S256),
            512 => Ok(TextureSize::S512),
            1024 => Ok(TextureSize::S1024),
            2048 => Ok(TextureSize::S2048),
            4096 => Ok(TextureSize::S4096),
            8192 => Ok(TextureSize::S8192),
            other => Err(format!(
                "unsupported shadow atlas size {other}, expected one of 256, 512, 1024, 2048, 4096, 8192"
            )),
        }
    }
}

impl From<TextureSize> for u32 {
    fn from(size: TextureSize) -> Self {
        size.pixels()
    }
}

/// PCF kernel used when sampling the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterQuality {
    #[default]
    Pcf2x2,
    Pcf3x3,
    Pcf5x5,
    Pcf7x7,
}

impl FilterQuality {
    pub const fn ordinal(self) -> u32 {
        match self {
            FilterQuality::Pcf2x2 => 0,
            FilterQuality::Pcf3x3 => 1,
            FilterQuality::Pcf5x5 => 2,
            FilterQuality::Pcf7x7 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeBlendMode {
    #[default]
    Hard,
    Soft,
    Dither,
}

impl CascadeBlendMode {
    pub const fn ordinal(self) -> u32 {
        match self {
            CascadeBlendMode::Hard => 0,
            CascadeBlendMode::Soft => 1,
            CascadeBlendMode::Dither => 2,
        }
    }
}

/// How baked shadow masks combine with realtime shadows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMaskMode {
    /// Baked mask replaces realtime shadows for static casters everywhere.
    Shadowmask,
    /// Realtime shadows inside the max distance, baked mask beyond it.
    #[default]
    DistanceShadowmask,
}

impl ShadowSettings {
    const fn default_max_distance() -> f32 {
        100.0
    }

    const fn default_distance_fade() -> f32 {
        0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_settings() -> ShadowSettings {
        ShadowSettings {
            max_distance: 0.0,
            distance_fade: 2.0,
            shadow_mask_mode: ShadowMaskMode::Shadowmask,
            directional: DirectionalShadowSettings {
                cascade_count: 7,
                cascade_ratios: [-0.5, 0.25, 3.0],
                cascade_fade: 0.0,
                ..DirectionalShadowSettings::default()
            },
            other: OtherShadowSettings::default(),
        }
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let validated = invalid_settings().validate();

        assert_eq!(validated.max_distance, 0.001);
        assert_eq!(validated.distance_fade, 1.0);
        assert_eq!(validated.directional.cascade_count, 4);
        assert_eq!(validated.directional.cascade_ratios, [0.0, 0.25, 1.0]);
        assert_eq!(validated.directional.cascade_fade, 0.001);
        assert_eq!(validated.shadow_mask_mode, ShadowMaskMode::Shadowmask);
    }

    #[test]
    fn validate_raises_zero_cascades_to_one() {
        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 0;
        assert_eq!(settings.validate().directional.cascade_count, 1);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = ShadowSettings::default();
        assert_eq!(valid.validate(), valid);
    }

    #[test]
    fn atlas_size_parses_from_pixel_count() {
        let json = r#"{ "directional": { "atlas_size": 2048, "filter": "pcf5x5", "cascade_blend": "dither" } }"#;
        let settings: ShadowSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.directional.atlas_size, TextureSize::S2048);
        assert_eq!(settings.directional.atlas_size.pixels(), 2048);
        assert_eq!(settings.directional.filter, FilterQuality::Pcf5x5);
        assert_eq!(settings.directional.cascade_blend, CascadeBlendMode::Dither);
        assert_eq!(settings.directional.cascade_count, 4);
        assert_eq!(settings.max_distance, 100.0);
    }

    #[test]
    fn atlas_size_rejects_non_power_of_two() {
        let json = r#"{ "directional": { "atlas_size": 1000 } }"#;
        assert!(serde_json::from_str::<ShadowSettings>(json).is_err());
    }

    #[test]
    fn atlas_size_serializes_as_pixels() {
        let value = serde_json::to_value(TextureSize::S4096).unwrap();
        assert_eq!(value, serde_json::json!(4096));
    }

    #[test]
    fn missing_settings_file_uses_defaults() {
        let settings = PipelineSettings::load_from_path("does/not/exist/pipeline.json");
        assert!(settings.use_lights_per_object);
        assert_eq!(settings.shadows, ShadowSettings::default());
    }
}
