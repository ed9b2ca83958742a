//! Viewer configuration.
//!
//! Every value has a built-in default reproducing the stock scene. A TOML
//! file only needs the keys it wants to change: the file is merged over the
//! serialized defaults before being deserialized, so a partial
//! `[left_light]` table keeps the left light's own color and ambient terms.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use winit::dpi::LogicalSize;

use prism_engine::window::RuntimeConfig;

/// Name of the config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "prism.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub pyramid: PyramidConfig,
    pub material: MaterialConfig,
    pub dir_light: DirLightConfig,
    pub right_light: PointLightConfig,
    pub left_light: PointLightConfig,
    pub spot_light: SpotLightConfig,
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub resizable: bool,
    pub capture_cursor: bool,
    pub clear_color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    /// Vertical field of view.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Degrees of yaw per unit of horizontal mouse motion.
    pub yaw_sensitivity: f32,
    /// Degrees of pitch per unit of vertical mouse motion.
    pub pitch_sensitivity: f32,
    pub pitch_limit_deg: f32,
    /// Units per second.
    pub speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PyramidConfig {
    pub position: [f32; 3],
    pub scale: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialConfig {
    pub diffuse_map: PathBuf,
    pub specular_map: PathBuf,
    pub shininess: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirLightConfig {
    pub direction: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    /// Roughly a 50 unit falloff range.
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointLightConfig {
    pub position: [f32; 3],
    /// Tint multiplied into every term; components above 1.0 overdrive the light.
    pub color: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub attenuation: Attenuation,
    /// Uniform scale of the unlit marker drawn at `position`.
    pub marker_scale: f32,
}

/// Spot light anchored at the right point light, aimed along the camera's view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpotLightConfig {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub attenuation: Attenuation,
    pub cutoff_deg: f32,
    pub outer_cutoff_deg: f32,
}

/// When shader programs and material textures are rebuilt from disk.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetReload {
    /// Load once at startup.
    Once,
    /// Rebuild on every frame.
    EveryFrame,
    /// Rebuild when a shader or texture file's modification time changes.
    OnChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsConfig {
    /// Base for relative asset paths. Defaults to the config file's directory,
    /// or the viewer crate directory when running on built-in defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    pub shader_dir: PathBuf,
    pub reload: AssetReload,
    /// Flip texture rows on load, for images authored bottom-up.
    pub flip_vertically: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let brick = PathBuf::from("assets/brickWall.png");

        Self {
            window: WindowConfig {
                title: "PyramidWindow".to_string(),
                width: 800.0,
                height: 600.0,
                resizable: true,
                capture_cursor: true,
                clear_color: [0.0, 0.0, 0.0],
            },
            camera: CameraConfig {
                position: [0.0, 0.0, 3.0],
                yaw_deg: -90.0,
                pitch_deg: 0.0,
                fov_deg: 45.0,
                near: 0.1,
                far: 100.0,
                yaw_sensitivity: 1.0,
                pitch_sensitivity: 0.4,
                pitch_limit_deg: 89.0,
                speed: 1.0,
                min_speed: 1.0,
                max_speed: 7.0,
            },
            pyramid: PyramidConfig {
                position: [0.0, 0.0, 0.0],
                scale: [2.0, 2.0, 2.0],
            },
            material: MaterialConfig {
                diffuse_map: brick.clone(),
                specular_map: brick,
                shininess: 25.0,
            },
            dir_light: DirLightConfig {
                direction: [-0.5, -1.0, 1.3],
                ambient: [0.05; 3],
                diffuse: [0.4; 3],
                specular: [0.5; 3],
            },
            right_light: PointLightConfig {
                position: [1.0, 2.0, 0.0],
                color: [0.1, 5.0, 0.1],
                ambient: [0.5; 3],
                diffuse: [0.1; 3],
                specular: [0.5; 3],
                attenuation: Attenuation::default(),
                marker_scale: 0.5,
            },
            left_light: PointLightConfig {
                position: [-4.0, -1.0, 0.0],
                color: [9.0, 0.1, 0.1],
                ambient: [0.1; 3],
                diffuse: [0.1; 3],
                specular: [0.1; 3],
                attenuation: Attenuation::default(),
                marker_scale: 0.5,
            },
            spot_light: SpotLightConfig {
                ambient: [0.0; 3],
                diffuse: [1.0; 3],
                specular: [1.0; 3],
                attenuation: Attenuation::default(),
                cutoff_deg: 12.5,
                outer_cutoff_deg: 15.0,
            },
            assets: AssetsConfig {
                root: None,
                shader_dir: PathBuf::from("shaders"),
                reload: AssetReload::OnChange,
                flip_vertically: false,
            },
        }
    }
}

impl ViewerConfig {
    /// Loads the configuration.
    ///
    /// `explicit` must exist and parse. Without it, `prism.toml` in the working
    /// directory is used if present, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };

        let Some(path) = path else {
            log::info!("no {DEFAULT_CONFIG_FILE} found; using built-in scene");
            let mut config = Self::default();
            config.assets.root = Some(default_asset_root());
            return Ok(config);
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::from_toml_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;

        if config.assets.root.is_none() {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
            config.assets.root = Some(dir.to_path_buf());
        }

        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses a TOML document merged over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let overlay: toml::Table = text.parse().context("malformed TOML")?;

        let toml::Value::Table(mut merged) =
            toml::Value::try_from(Self::default()).context("failed to serialize defaults")?
        else {
            anyhow::bail!("defaults did not serialize to a table");
        };
        merge_tables(&mut merged, overlay);

        let config: Self = toml::Value::Table(merged)
            .try_into()
            .context("config does not match the expected schema")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the camera and lighting math cannot work with.
    pub fn validate(&self) -> Result<()> {
        let cam = &self.camera;
        anyhow::ensure!(
            cam.min_speed <= cam.max_speed,
            "camera.min_speed ({}) exceeds camera.max_speed ({})",
            cam.min_speed,
            cam.max_speed
        );
        anyhow::ensure!(
            cam.pitch_limit_deg > 0.0 && cam.pitch_limit_deg < 90.0,
            "camera.pitch_limit_deg must be in (0, 90), got {}",
            cam.pitch_limit_deg
        );
        anyhow::ensure!(
            cam.near > 0.0 && cam.near < cam.far,
            "camera planes need 0 < near < far, got near {} far {}",
            cam.near,
            cam.far
        );

        let spot = &self.spot_light;
        anyhow::ensure!(
            spot.outer_cutoff_deg > spot.cutoff_deg,
            "spot_light.outer_cutoff_deg ({}) must exceed cutoff_deg ({})",
            spot.outer_cutoff_deg,
            spot.cutoff_deg
        );

        for (name, light) in [("right_light", &self.right_light), ("left_light", &self.left_light)] {
            anyhow::ensure!(
                light.marker_scale > 0.0,
                "{name}.marker_scale must be positive, got {}",
                light.marker_scale
            );
        }

        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.window.title.clone(),
            initial_size: LogicalSize::new(self.window.width, self.window.height),
            resizable: self.window.resizable,
            capture_cursor: self.window.capture_cursor,
        }
    }

    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b] = self.window.clear_color;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

impl AssetsConfig {
    /// Resolves an asset path against `root`. Absolute paths are returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        }
    }

    pub fn shader_dir(&self) -> PathBuf {
        self.resolve(&self.shader_dir)
    }
}

/// Asset root used without a config file: the executable's directory when
/// assets were shipped next to it, otherwise the viewer crate directory.
fn default_asset_root() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    pick_asset_root(exe_dir.as_deref(), Path::new(env!("CARGO_MANIFEST_DIR")))
}

fn pick_asset_root(exe_dir: Option<&Path>, build_dir: &Path) -> PathBuf {
    match exe_dir {
        Some(dir) if dir.join("shaders").is_dir() || dir.join("assets").is_dir() => dir.to_path_buf(),
        _ => build_dir.to_path_buf(),
    }
}

/// Recursively overlays `overlay` onto `base`. Tables merge; everything else replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_child)), toml::Value::Table(overlay_child)) => {
                merge_tables(base_child, overlay_child);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
