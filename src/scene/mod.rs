// scene/mod.rs

pub mod camera;
pub mod components;
pub mod culling;

pub use camera::Camera;
pub use culling::SceneCulling;

pub use components::{
    CastShadows,
    DirectionalLight,
    PointLight,
    Pose,
    ShadowCaster,
    SpotLight,
};
