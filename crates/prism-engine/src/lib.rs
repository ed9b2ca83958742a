//! Prism engine crate.
//!
//! Owns the platform + GPU runtime pieces the viewer builds on: the window
//! loop, the wgpu device and depth buffer, input translation, frame timing
//! and logger setup.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
