use bitflags::bitflags;

use crate::renderer::commands::CommandRecorder;
use crate::settings::{ShadowMaskMode, ShadowSettings};

pub const DIRECTIONAL_FILTER_KEYWORDS: [&str; 3] =
    ["_DIRECTIONAL_PCF3", "_DIRECTIONAL_PCF5", "_DIRECTIONAL_PCF7"];
pub const CASCADE_BLEND_KEYWORDS: [&str; 2] = ["_CASCADE_BLEND_SOFT", "_CASCADE_BLEND_DITHER"];
pub const SHADOW_MASK_KEYWORDS: [&str; 2] = ["_SHADOW_MASK_ALWAYS", "_SHADOW_MASK_DISTANCE"];
pub const LIGHTS_PER_OBJECT_KEYWORD: &str = "_LIGHTS_PER_OBJECT";

bitflags! {
    /// Shadow shader variant chosen for a frame. At most one flag per group is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShadowKeywords: u32 {
        const PCF3 = 1 << 0;
        const PCF5 = 1 << 1;
        const PCF7 = 1 << 2;
        const CASCADE_BLEND_SOFT = 1 << 3;
        const CASCADE_BLEND_DITHER = 1 << 4;
        const SHADOW_MASK_ALWAYS = 1 << 5;
        const SHADOW_MASK_DISTANCE = 1 << 6;
    }
}

const FILTER_FLAGS: [ShadowKeywords; 3] = [
    ShadowKeywords::PCF3,
    ShadowKeywords::PCF5,
    ShadowKeywords::PCF7,
];
const CASCADE_BLEND_FLAGS: [ShadowKeywords; 2] = [
    ShadowKeywords::CASCADE_BLEND_SOFT,
    ShadowKeywords::CASCADE_BLEND_DITHER,
];
const SHADOW_MASK_FLAGS: [ShadowKeywords; 2] = [
    ShadowKeywords::SHADOW_MASK_ALWAYS,
    ShadowKeywords::SHADOW_MASK_DISTANCE,
];

impl ShadowKeywords {
    /// Picks the variant for `settings`. `uses_shadow_mask` is only known
    /// once every light of the frame has been reserved.
    pub fn select(settings: &ShadowSettings, uses_shadow_mask: bool) -> Self {
        let mut keywords = Self::empty();

        let filter = settings.directional.filter.ordinal() as usize;
        if let Some(flag) = filter.checked_sub(1).and_then(|i| FILTER_FLAGS.get(i)) {
            keywords |= *flag;
        }

        let blend = settings.directional.cascade_blend.ordinal() as usize;
        if let Some(flag) = blend.checked_sub(1).and_then(|i| CASCADE_BLEND_FLAGS.get(i)) {
            keywords |= *flag;
        }

        if uses_shadow_mask {
            keywords |= match settings.shadow_mask_mode {
                ShadowMaskMode::Shadowmask => ShadowKeywords::SHADOW_MASK_ALWAYS,
                ShadowMaskMode::DistanceShadowmask => ShadowKeywords::SHADOW_MASK_DISTANCE,
            };
        }

        keywords
    }

    /// Explicitly enables or disables every keyword of every group.
    pub fn apply<R: CommandRecorder + ?Sized>(self, recorder: &mut R) {
        self.apply_group(recorder, &DIRECTIONAL_FILTER_KEYWORDS, &FILTER_FLAGS);
        self.apply_group(recorder, &CASCADE_BLEND_KEYWORDS, &CASCADE_BLEND_FLAGS);
        self.apply_group(recorder, &SHADOW_MASK_KEYWORDS, &SHADOW_MASK_FLAGS);
    }

    fn apply_group<R: CommandRecorder + ?Sized>(
        self,
        recorder: &mut R,
        keywords: &[&'static str],
        flags: &[ShadowKeywords],
    ) {
        for (keyword, flag) in keywords.iter().copied().zip(flags) {
            if self.contains(*flag) {
                recorder.enable_keyword(keyword);
            } else {
                recorder.disable_keyword(keyword);
            }
        }
    }
}

/// Enables only `keywords[enabled]`; `None` disables the whole group.
pub fn set_keywords<R: CommandRecorder + ?Sized>(
    recorder: &mut R,
    keywords: &[&'static str],
    enabled: Option<usize>,
) {
    for (index, keyword) in keywords.iter().copied().enumerate() {
        if Some(index) == enabled {
            recorder.enable_keyword(keyword);
        } else {
            recorder.disable_keyword(keyword);
        }
    }
}
