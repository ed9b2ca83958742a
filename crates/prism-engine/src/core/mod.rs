//! Core engine-facing contracts.
//!
//! The stable interface between the runtime (platform loop) and the viewer.
//! Keeps runtime internals out of application code and hands it a single
//! per-frame context.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
