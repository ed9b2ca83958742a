//! Renderer-facing handles.
//!
//! Renderers receive a `RenderCtx` (device, queue, formats, viewport) and a
//! `RenderTarget` (encoder + attachments). Each renderer owns its own GPU
//! resources (pipelines, buffers, textures).
//!
//! The color and depth attachments are already cleared when a renderer sees
//! them; renderers begin their passes with `LoadOp::Load`.

mod ctx;
mod viewport;

pub use ctx::{RenderCtx, RenderTarget};
pub use viewport::Viewport;
