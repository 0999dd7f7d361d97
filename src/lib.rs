pub mod renderer;
pub mod scene;
pub mod settings;

pub use renderer::{CommandBuffer, CommandRecorder, CullingResults, Lighting, Shadows};
pub use settings::{PipelineSettings, ShadowSettings};

/// Installs the env_logger backend, `RUST_LOG` overrides the info default.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
