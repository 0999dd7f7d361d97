pub mod atlas;
pub mod cascades;
pub mod commands;
pub mod culling;
pub mod keywords;
pub mod lighting;
pub mod lights;
pub mod shadows;

pub use atlas::{convert_to_atlas_matrix, AtlasLayout};
pub use cascades::{CascadeTables, DirectionalShadowsUniform};
pub use commands::{ClipConventions, CommandBuffer, CommandRecorder, ShadowCommand};
pub use culling::{Bounds, CullingResults, LightShadowParams, LightType, VisibleLight};
pub use keywords::ShadowKeywords;
pub use lighting::Lighting;
pub use lights::{LightTables, LightsUniform};
pub use shadows::{AtlasAllocation, ShadowData, Shadows};
