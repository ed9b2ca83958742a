//! CPU mirrors of the WGSL uniform blocks.
//!
//! `vec3<f32>` members align to 16 bytes in WGSL; every `[f32; 3]` below is
//! followed by either a scalar the shader reads or explicit padding.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Quat, Vec3};

use crate::camera::FlyCamera;
use crate::config::{Attenuation, DirLightConfig, PointLightConfig, SpotLightConfig, ViewerConfig};

/// Bind group 0, shared by both pipelines.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub _pad: f32,
}

/// Bind group 1: one per drawn object.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    /// `mat3x3<f32>`: three columns, each padded to a vec4.
    pub normal_matrix: [[f32; 4]; 3],
}

impl ModelUniform {
    pub fn from_model(model: Mat4) -> Self {
        let n = Mat3::from_mat4(model).inverse().transpose();
        let col = |c: Vec3| [c.x, c.y, c.z, 0.0];
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: [col(n.x_axis), col(n.y_axis), col(n.z_axis)],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DirLightUniform {
    pub direction: [f32; 3],
    pub _pad0: f32,
    pub ambient: [f32; 3],
    pub _pad1: f32,
    pub diffuse: [f32; 3],
    pub _pad2: f32,
    pub specular: [f32; 3],
    pub _pad3: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 3],
    pub constant: f32,
    pub color: [f32; 3],
    pub linear: f32,
    pub ambient: [f32; 3],
    pub quadratic: f32,
    pub diffuse: [f32; 3],
    pub _pad0: f32,
    pub specular: [f32; 3],
    pub _pad1: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpotLightUniform {
    pub position: [f32; 3],
    pub constant: f32,
    pub direction: [f32; 3],
    pub linear: f32,
    pub ambient: [f32; 3],
    pub quadratic: f32,
    pub diffuse: [f32; 3],
    /// Cosine of the inner cone half-angle.
    pub cut_off: f32,
    pub specular: [f32; 3],
    /// Cosine of the outer cone half-angle.
    pub outer_cut_off: f32,
}

/// Bind group 2.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightingUniform {
    pub dir_light: DirLightUniform,
    pub point_lights: [PointLightUniform; 2],
    pub spot_light: SpotLightUniform,
    pub shininess: f32,
    pub _pad: [f32; 3],
}

impl DirLightUniform {
    fn new(cfg: &DirLightConfig) -> Self {
        Self {
            direction: cfg.direction,
            ambient: cfg.ambient,
            diffuse: cfg.diffuse,
            specular: cfg.specular,
            ..Self::zeroed()
        }
    }
}

impl PointLightUniform {
    fn new(cfg: &PointLightConfig) -> Self {
        let Attenuation { constant, linear, quadratic } = cfg.attenuation;
        Self {
            position: cfg.position,
            constant,
            color: cfg.color,
            linear,
            ambient: cfg.ambient,
            quadratic,
            diffuse: cfg.diffuse,
            specular: cfg.specular,
            ..Self::zeroed()
        }
    }
}

impl SpotLightUniform {
    fn new(cfg: &SpotLightConfig, position: Vec3, direction: Vec3) -> Self {
        let Attenuation { constant, linear, quadratic } = cfg.attenuation;
        Self {
            position: position.to_array(),
            constant,
            direction: direction.to_array(),
            linear,
            ambient: cfg.ambient,
            quadratic,
            diffuse: cfg.diffuse,
            cut_off: cfg.cutoff_deg.to_radians().cos(),
            specular: cfg.specular,
            outer_cut_off: cfg.outer_cutoff_deg.to_radians().cos(),
        }
    }
}

/// Everything the renderer uploads for one frame.
#[derive(Copy, Clone, Debug)]
pub struct FrameUniforms {
    pub camera: CameraUniform,
    pub pyramid: ModelUniform,
    /// Right light marker, then left.
    pub markers: [ModelUniform; 2],
    pub lighting: LightingUniform,
}

impl FrameUniforms {
    pub fn build(config: &ViewerConfig, camera: &FlyCamera, aspect: f32) -> Self {
        let camera_uniform = CameraUniform {
            view: camera.view().to_cols_array_2d(),
            projection: camera.projection(aspect).to_cols_array_2d(),
            view_pos: camera.position().to_array(),
            _pad: 0.0,
        };

        let pyramid = Mat4::from_scale_rotation_translation(
            Vec3::from_array(config.pyramid.scale),
            Quat::IDENTITY,
            Vec3::from_array(config.pyramid.position),
        );

        let marker = |light: &PointLightConfig| {
            ModelUniform::from_model(Mat4::from_scale_rotation_translation(
                Vec3::splat(light.marker_scale),
                Quat::IDENTITY,
                Vec3::from_array(light.position),
            ))
        };

        let lighting = LightingUniform {
            dir_light: DirLightUniform::new(&config.dir_light),
            point_lights: [
                PointLightUniform::new(&config.right_light),
                PointLightUniform::new(&config.left_light),
            ],
            spot_light: SpotLightUniform::new(
                &config.spot_light,
                Vec3::from_array(config.right_light.position),
                camera.front(),
            ),
            shininess: config.material.shininess,
            _pad: [0.0; 3],
        };

        Self {
            camera: camera_uniform,
            pyramid: ModelUniform::from_model(pyramid),
            markers: [marker(&config.right_light), marker(&config.left_light)],
            lighting,
        }
    }
}
