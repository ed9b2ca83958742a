//! `prism`: a textured, Phong-lit pyramid you can fly around.
//!
//! Usage: `prism [config.toml]`. Without an argument, `prism.toml` in the
//! working directory is used if it exists.
//!
//! Controls: mouse to look, W/A/S/D to fly, E/Q up/down, wheel for speed,
//! F5 to reload shaders and textures, Esc to quit.

mod app;
mod assets;
mod camera;
mod config;
mod mesh;
mod renderer;
mod shaders;
mod texture;
mod uniforms;

use std::path::PathBuf;

use anyhow::Result;

use prism_engine::device::GpuInit;
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::window::Runtime;

use crate::app::ViewerApp;
use crate::config::ViewerConfig;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ViewerConfig::load(config_path.as_deref())?;

    let runtime = config.runtime_config();
    Runtime::run(runtime, GpuInit::default(), ViewerApp::new(config))
}
