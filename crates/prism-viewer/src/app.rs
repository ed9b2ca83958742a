use prism_engine::core::{App, AppControl, FrameCtx};
use prism_engine::input::{InputFrame, Key};

use crate::assets::ReloadTracker;
use crate::camera::{FlyCamera, Movement};
use crate::config::ViewerConfig;
use crate::renderer::{PyramidRenderer, RenderAssets};
use crate::uniforms::FrameUniforms;

/// Pyramid viewer: mouse look, WASD/EQ flight, wheel-controlled speed.
pub struct ViewerApp {
    config: ViewerConfig,
    camera: FlyCamera,
    renderer: PyramidRenderer,
    tracker: ReloadTracker,
    /// Set until a frame is actually drawn; reloads wait out a minimized window.
    reload_pending: bool,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> Self {
        let assets = RenderAssets::from_config(&config);
        let tracker = ReloadTracker::new(assets.watched_paths());

        Self {
            camera: FlyCamera::new(&config.camera),
            renderer: PyramidRenderer::new(assets),
            tracker,
            reload_pending: false,
            config,
        }
    }

    /// Applies one frame of input to the camera.
    fn steer(&mut self, ctx: &FrameCtx<'_, '_>) {
        let (dx, dy) = ctx.input_frame.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            self.camera.apply_mouse(dx, dy);
        }
        self.camera.apply_scroll(ctx.input_frame.wheel_lines);
        self.camera.apply_movement(Movement::from_input(ctx.input), ctx.time.dt);
    }

    /// Marks assets for rebuild per the reload policy or an F5 press.
    fn note_reload_requests(&mut self, input_frame: &InputFrame) {
        if self.tracker.should_reload(self.config.assets.reload) {
            self.reload_pending = true;
        }
        if input_frame.key_pressed(Key::F5) {
            log::info!("F5: forcing asset reload");
            self.reload_pending = true;
        }
    }
}

impl App for ViewerApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input.key_down(Key::Escape) {
            log::info!("escape pressed; exiting");
            return AppControl::Exit;
        }

        self.steer(ctx);

        self.note_reload_requests(ctx.input_frame);

        let uniforms = FrameUniforms::build(&self.config, &self.camera, ctx.viewport().aspect());
        let (renderer, reload_pending) = (&mut self.renderer, &mut self.reload_pending);

        ctx.render(self.config.clear_color(), |rctx, target| {
            if std::mem::take(reload_pending) {
                renderer.reload(rctx);
            }
            renderer.render(rctx, target, &uniforms);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetReload;
    use glam::Vec3;

    #[test]
    fn camera_starts_from_config() {
        let mut config = ViewerConfig::default();
        config.camera.position = [1.0, 2.0, 3.0];
        let app = ViewerApp::new(config);
        assert_eq!(app.camera.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn first_frame_requests_a_reload() {
        let mut app = ViewerApp::new(ViewerConfig::default());
        let policy = app.config.assets.reload;
        assert!(app.tracker.should_reload(policy));
    }

    // ── reload requests ──────────────────────────────────────────────────

    fn once_app() -> ViewerApp {
        let mut config = ViewerConfig::default();
        config.assets.reload = AssetReload::Once;
        ViewerApp::new(config)
    }

    fn f5_frame() -> InputFrame {
        let mut frame = InputFrame::default();
        frame.keys_pressed.insert(Key::F5);
        frame
    }

    #[test]
    fn first_frame_marks_reload_pending() {
        let mut app = once_app();
        app.note_reload_requests(&InputFrame::default());
        assert!(app.reload_pending);
    }

    #[test]
    fn once_policy_stays_idle_without_f5() {
        let mut app = once_app();
        app.note_reload_requests(&InputFrame::default());
        app.reload_pending = false;

        app.note_reload_requests(&InputFrame::default());
        assert!(!app.reload_pending);
    }

    #[test]
    fn f5_forces_reload_under_once_policy() {
        let mut app = once_app();
        app.note_reload_requests(&InputFrame::default());
        app.reload_pending = false;

        app.note_reload_requests(&f5_frame());
        assert!(app.reload_pending);
    }

    #[test]
    fn pending_reload_survives_undrawn_frames() {
        let mut app = once_app();
        app.note_reload_requests(&f5_frame());
        app.note_reload_requests(&InputFrame::default());
        app.note_reload_requests(&InputFrame::default());
        assert!(app.reload_pending);
    }
}
