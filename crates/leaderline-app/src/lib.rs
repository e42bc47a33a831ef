//! LeaderLine Application
//!
//! Hosts for the connector engine: a native renderer that lays out a scene
//! file and writes it as SVG, and the `<leader-line>` custom element for the
//! browser.

#[cfg(feature = "native")]
mod args;
mod config;
pub mod detail;
mod error;
pub mod handles;
mod scene;

#[cfg(feature = "native")]
pub use args::Args;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use scene::{DragSpec, Scene, SceneElement, SceneLine, SceneRenderer};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;

/// Render `args.input` to `args.output`.
#[cfg(feature = "native")]
pub async fn run(args: &Args) -> AppResult<()> {
    log::info!("Rendering scene {}", args.input);
    let scene = Scene::from_json(&std::fs::read_to_string(&args.input)?)?;
    let mut renderer = SceneRenderer::new(scene, AppConfig::default())?;
    renderer.apply_drags(&args.drags)?;
    renderer.reposition_all().await;
    std::fs::write(&args.output, renderer.to_svg())?;
    log::info!("SVG written to {}", args.output);
    Ok(())
}
