use std::path::PathBuf;

use prism_engine::render::{RenderCtx, RenderTarget};

use crate::config::ViewerConfig;
use crate::mesh::{self, MeshBuffers};
use crate::shaders::{self, ShaderOrigin, ShaderSource};
use crate::texture::GpuTexture;
use crate::uniforms::{CameraUniform, FrameUniforms, LightingUniform, ModelUniform};

/// Files the renderer rebuilds from on reload.
#[derive(Debug, Clone)]
pub struct RenderAssets {
    pub shader_dir: PathBuf,
    pub diffuse_map: PathBuf,
    pub specular_map: PathBuf,
    pub flip_vertically: bool,
}

impl RenderAssets {
    pub fn from_config(config: &ViewerConfig) -> Self {
        let assets = &config.assets;
        Self {
            shader_dir: assets.shader_dir(),
            diffuse_map: assets.resolve(&config.material.diffuse_map),
            specular_map: assets.resolve(&config.material.specular_map),
            flip_vertically: assets.flip_vertically,
        }
    }

    /// Every file whose modification should trigger a reload.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![
            shaders::shader_path(&self.shader_dir, shaders::LIT),
            shaders::shader_path(&self.shader_dir, shaders::MARKER),
            self.diffuse_map.clone(),
        ];
        if self.specular_map != self.diffuse_map {
            paths.push(self.specular_map.clone());
        }
        paths
    }
}

struct Layouts {
    camera: wgpu::BindGroupLayout,
    model: wgpu::BindGroupLayout,
    lighting: wgpu::BindGroupLayout,
    material: wgpu::BindGroupLayout,
}

/// Uniform buffers and their bind groups. Models: pyramid, right marker, left marker.
struct UniformSet {
    camera_ubo: wgpu::Buffer,
    model_ubos: [wgpu::Buffer; 3],
    lighting_ubo: wgpu::Buffer,

    camera_bg: wgpu::BindGroup,
    model_bgs: [wgpu::BindGroup; 3],
    lighting_bg: wgpu::BindGroup,
}

struct Pipelines {
    lit: wgpu::RenderPipeline,
    marker: wgpu::RenderPipeline,
}

struct Material {
    bind_group: wgpu::BindGroup,
    // Kept alive for the bind group.
    _diffuse: GpuTexture,
    _specular: GpuTexture,
}

/// Draws the lit pyramid and the two light markers.
///
/// GPU objects are created lazily on the first `render`. Pipelines follow the
/// surface format; `reload` rebuilds them and the material textures from disk.
pub struct PyramidRenderer {
    assets: RenderAssets,

    layouts: Option<Layouts>,
    uniforms: Option<UniformSet>,
    mesh: Option<MeshBuffers>,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipelines: Option<Pipelines>,
    material: Option<Material>,
}

impl PyramidRenderer {
    pub fn new(assets: RenderAssets) -> Self {
        Self {
            assets,
            layouts: None,
            uniforms: None,
            mesh: None,
            pipeline_format: None,
            pipelines: None,
            material: None,
        }
    }

    /// Rebuilds both pipelines and the material textures from disk.
    pub fn reload(&mut self, ctx: &RenderCtx<'_>) {
        log::debug!("reloading shaders and textures");
        self.ensure_layouts(ctx);
        self.build_pipelines(ctx);
        self.build_material(ctx);
    }

    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, frame: &FrameUniforms) {
        self.ensure_layouts(ctx);
        self.ensure_uniforms(ctx);
        if self.mesh.is_none() {
            self.mesh = Some(MeshBuffers::new(ctx.device));
        }
        if self.pipeline_format != Some(ctx.surface_format) || self.pipelines.is_none() {
            self.build_pipelines(ctx);
        }
        if self.material.is_none() {
            self.build_material(ctx);
        }

        let (Some(uniforms), Some(mesh), Some(pipelines), Some(material)) =
            (&self.uniforms, &self.mesh, &self.pipelines, &self.material)
        else {
            return;
        };

        let q = ctx.queue;
        q.write_buffer(&uniforms.camera_ubo, 0, bytemuck::bytes_of(&frame.camera));
        q.write_buffer(&uniforms.lighting_ubo, 0, bytemuck::bytes_of(&frame.lighting));
        let models = [frame.pyramid, frame.markers[0], frame.markers[1]];
        for (ubo, model) in uniforms.model_ubos.iter().zip(&models) {
            q.write_buffer(ubo, 0, bytemuck::bytes_of(model));
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let vertices = 0..mesh.vertex_count;

        rpass.set_pipeline(&pipelines.lit);
        rpass.set_bind_group(0, &uniforms.camera_bg, &[]);
        rpass.set_bind_group(1, &uniforms.model_bgs[0], &[]);
        rpass.set_bind_group(2, &uniforms.lighting_bg, &[]);
        rpass.set_bind_group(3, &material.bind_group, &[]);
        rpass.set_vertex_buffer(0, mesh.lit.slice(..));
        rpass.draw(vertices.clone(), 0..1);

        rpass.set_pipeline(&pipelines.marker);
        rpass.set_vertex_buffer(0, mesh.marker.slice(..));
        for marker_bg in &uniforms.model_bgs[1..] {
            rpass.set_bind_group(1, marker_bg, &[]);
            rpass.draw(vertices.clone(), 0..1);
        }
    }

    fn ensure_layouts(&mut self, ctx: &RenderCtx<'_>) {
        if self.layouts.is_some() {
            return;
        }

        let device = ctx.device;
        let uniform_layout = |label: &str, size: usize, visibility: wgpu::ShaderStages| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size as u64),
                    },
                    count: None,
                }],
            })
        };

        let vertex_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let camera = uniform_layout("prism camera bgl", size_of::<CameraUniform>(), vertex_fragment);
        let model = uniform_layout("prism model bgl", size_of::<ModelUniform>(), wgpu::ShaderStages::VERTEX);
        let lighting =
            uniform_layout("prism lighting bgl", size_of::<LightingUniform>(), wgpu::ShaderStages::FRAGMENT);

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism material bgl"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        self.layouts = Some(Layouts {
            camera,
            model,
            lighting,
            material,
        });
    }

    fn ensure_uniforms(&mut self, ctx: &RenderCtx<'_>) {
        if self.uniforms.is_some() {
            return;
        }
        let Some(layouts) = self.layouts.as_ref() else { return };

        let device = ctx.device;
        let ubo = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let bind = |label: &str, layout: &wgpu::BindGroupLayout, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };

        let camera_ubo = ubo("prism camera ubo", size_of::<CameraUniform>());
        let lighting_ubo = ubo("prism lighting ubo", size_of::<LightingUniform>());
        let model_ubos = [
            ubo("prism pyramid model ubo", size_of::<ModelUniform>()),
            ubo("prism right marker ubo", size_of::<ModelUniform>()),
            ubo("prism left marker ubo", size_of::<ModelUniform>()),
        ];

        let camera_bg = bind("prism camera bind group", &layouts.camera, &camera_ubo);
        let lighting_bg = bind("prism lighting bind group", &layouts.lighting, &lighting_ubo);
        let model_bgs = [
            bind("prism pyramid model bind group", &layouts.model, &model_ubos[0]),
            bind("prism right marker bind group", &layouts.model, &model_ubos[1]),
            bind("prism left marker bind group", &layouts.model, &model_ubos[2]),
        ];

        self.uniforms = Some(UniformSet {
            camera_ubo,
            model_ubos,
            lighting_ubo,
            camera_bg,
            model_bgs,
            lighting_bg,
        });
    }

    fn build_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        let Some(layouts) = self.layouts.as_ref() else { return };
        let dir = &self.assets.shader_dir;

        let (Some(lit_src), Some(marker_src)) =
            (ShaderSource::load(dir, shaders::LIT), ShaderSource::load(dir, shaders::MARKER))
        else {
            log::error!("no shader source available in {}", dir.display());
            return;
        };

        let err = match compile_pipelines(ctx, layouts, &lit_src, &marker_src) {
            Ok(pipelines) => {
                log::debug!(
                    "pipelines built for {:?} (lit: {:?}, marker: {:?})",
                    ctx.surface_format,
                    lit_src.origin,
                    marker_src.origin
                );
                self.pipeline_format = Some(ctx.surface_format);
                self.pipelines = Some(pipelines);
                return;
            }
            Err(err) => err,
        };
        log::error!("shader build failed: {err}");

        let builtin_failed = lit_src.origin == ShaderOrigin::Embedded && marker_src.origin == ShaderOrigin::Embedded;
        let current = self.pipelines.is_some() && self.pipeline_format == Some(ctx.surface_format);
        match recovery(current, builtin_failed) {
            Recovery::KeepCurrent => log::warn!("keeping the previous pipelines until the shaders are fixed"),
            Recovery::GiveUp => log::error!("built-in shaders failed to build; nothing to draw with"),
            Recovery::Builtin => {
                let (Some(lit_src), Some(marker_src)) =
                    (ShaderSource::builtin(shaders::LIT), ShaderSource::builtin(shaders::MARKER))
                else {
                    return;
                };
                match compile_pipelines(ctx, layouts, &lit_src, &marker_src) {
                    Ok(pipelines) => {
                        log::warn!("drawing with built-in shaders until the files on disk are fixed");
                        self.pipeline_format = Some(ctx.surface_format);
                        self.pipelines = Some(pipelines);
                    }
                    Err(err) => log::error!("built-in shaders failed to build: {err}"),
                }
            }
        }
    }

    fn build_material(&mut self, ctx: &RenderCtx<'_>) {
        let Some(layouts) = self.layouts.as_ref() else { return };
        let RenderAssets {
            diffuse_map,
            specular_map,
            flip_vertically,
            ..
        } = &self.assets;

        let diffuse = GpuTexture::load_or_white(ctx.device, ctx.queue, diffuse_map, *flip_vertically);
        let specular = GpuTexture::load_or_white(ctx.device, ctx.queue, specular_map, *flip_vertically);

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism material bind group"),
            layout: &layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
            ],
        });

        self.material = Some(Material {
            bind_group,
            _diffuse: diffuse,
            _specular: specular,
        });
    }
}

/// Shared shape of both pipelines: triangle list, no culling, depth `Less`.
/// What to draw with after a shader build fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Recovery {
    /// The pipelines from the last good build still match the surface.
    KeepCurrent,
    /// Rebuild from the sources compiled into the binary.
    Builtin,
    GiveUp,
}

fn recovery(has_current: bool, builtin_failed: bool) -> Recovery {
    if has_current {
        Recovery::KeepCurrent
    } else if builtin_failed {
        Recovery::GiveUp
    } else {
        Recovery::Builtin
    }
}

/// Builds both pipelines inside a validation error scope; invalid WGSL comes
/// back as `Err`.
fn compile_pipelines(
    ctx: &RenderCtx<'_>,
    layouts: &Layouts,
    lit_src: &ShaderSource,
    marker_src: &ShaderSource,
) -> Result<Pipelines, wgpu::Error> {
    let scope = ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

    let lit = PipelineDesc {
        label: "prism lit pipeline",
        bind_group_layouts: &[&layouts.camera, &layouts.model, &layouts.lighting, &layouts.material],
        vertex_layout: mesh::lit_layout(),
    }
    .build(ctx, &lit_src.module(ctx.device));

    let marker = PipelineDesc {
        label: "prism marker pipeline",
        bind_group_layouts: &[&layouts.camera, &layouts.model],
        vertex_layout: mesh::marker_layout(),
    }
    .build(ctx, &marker_src.module(ctx.device));

    match pollster::block_on(scope.pop()) {
        Some(err) => Err(err),
        None => Ok(Pipelines { lit, marker }),
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    vertex_layout: wgpu::VertexBufferLayout<'static>,
}

impl PipelineDesc<'_> {
    fn build(self, ctx: &RenderCtx<'_>, shader: &wgpu::ShaderModule) -> wgpu::RenderPipeline {
        let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(self.label),
            bind_group_layouts: self.bind_group_layouts,
            immediate_size: 0,
        });

        ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[self.vertex_layout],
            },

            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            // Side winding is mixed; the pyramid is drawn double-sided.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: ctx.depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn shared_map_is_watched_once() {
        let mut config = ViewerConfig::default();
        config.assets.root = Some(PathBuf::from("/srv/prism"));
        let assets = RenderAssets::from_config(&config);

        assert_eq!(assets.diffuse_map, Path::new("/srv/prism/assets/brickWall.png"));
        assert_eq!(
            assets.watched_paths(),
            [
                PathBuf::from("/srv/prism/shaders/lit.wgsl"),
                PathBuf::from("/srv/prism/shaders/marker.wgsl"),
                PathBuf::from("/srv/prism/assets/brickWall.png"),
            ]
        );
    }

    #[test]
    fn distinct_specular_map_is_watched() {
        let mut config = ViewerConfig::default();
        config.material.specular_map = PathBuf::from("assets/brickWall_spec.png");
        let assets = RenderAssets::from_config(&config);
        assert_eq!(assets.watched_paths().len(), 4);
    }

    #[test]
    fn new_renderer_holds_no_gpu_state() {
        let renderer = PyramidRenderer::new(RenderAssets::from_config(&ViewerConfig::default()));
        assert!(renderer.pipelines.is_none());
        assert!(renderer.pipeline_format.is_none());
        assert!(!renderer.assets.flip_vertically);
    }

    // ── shader failure recovery ──────────────────────────────────────────

    #[test]
    fn broken_edit_keeps_working_pipelines() {
        assert_eq!(recovery(true, false), Recovery::KeepCurrent);
        assert_eq!(recovery(true, true), Recovery::KeepCurrent);
    }

    #[test]
    fn broken_startup_shaders_fall_back_to_builtin() {
        assert_eq!(recovery(false, false), Recovery::Builtin);
    }

    #[test]
    fn failing_builtin_is_not_retried() {
        assert_eq!(recovery(false, true), Recovery::GiveUp);
    }
}
