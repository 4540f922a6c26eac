//! wgpu-backed render surface.
//!
//! Particles are drawn as instanced screen-space quads. Two vertex buffers
//! feed the instances: a static one with colour and size, written once at
//! creation, and a position buffer rewritten whenever the frame loop stages
//! new positions.

mod camera;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec2, Vec2};
use tracing::{debug, info};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::PerspectiveCamera;

use crate::config::RenderConfig;
use crate::error::{GpuError, RenderError};
use crate::field::Particle;
use crate::host::RenderSurface;

pub(crate) const SHADER_SOURCE: &str = include_str!("points.wgsl");

const MSAA_SAMPLES: u32 = 4;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    viewport: [f32; 2],
    point_size: f32,
    opacity: f32,
    size_attenuation: u32,
    _padding: [u32; 3],
}

/// Per-particle data that never changes after spawn.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PointAttributes {
    color: [f32; 3],
    size: f32,
}

/// Everything that lives on the GPU. Dropped as one unit on teardown.
struct GpuResources {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    position_buffer: wgpu::Buffer,
    attribute_buffer: wgpu::Buffer,
    sample_count: u32,
    msaa_texture: Option<(wgpu::Texture, wgpu::TextureView)>,
}

/// The scene, camera and drawing surface for one backdrop.
pub struct GpuSurface {
    resources: Option<GpuResources>,
    camera: PerspectiveCamera,
    render_config: RenderConfig,
    num_particles: u32,
    staging: Vec<[f32; 3]>,
    positions_dirty: bool,
}

impl GpuSurface {
    pub async fn new(
        window: Arc<Window>,
        size: UVec2,
        particles: &[Particle],
        render_config: &RenderConfig,
    ) -> Result<Self, GpuError> {
        let width = size.x.max(1);
        let height = size.y.max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Backdrop Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        // Prefer a compositor mode that honours the transparent clear
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| surface_caps.alpha_modes.contains(mode))
        .or_else(|| surface_caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = if render_config.antialias
            && adapter
                .get_texture_format_features(surface_format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            1
        };
        let msaa_texture = create_msaa_texture(&device, &config, sample_count);

        // Buffers may not be empty, so a zero-particle field keeps one
        // placeholder instance that is never drawn.
        let mut staging: Vec<[f32; 3]> = particles.iter().map(|p| p.position.to_array()).collect();
        let mut attributes: Vec<PointAttributes> = particles
            .iter()
            .map(|p| PointAttributes {
                color: p.color.to_array(),
                size: p.size,
            })
            .collect();
        let num_particles = staging.len() as u32;
        if staging.is_empty() {
            staging.push([0.0; 3]);
            attributes.push(PointAttributes::zeroed());
        }

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Position Buffer"),
            contents: bytemuck::cast_slice(&staging),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let attribute_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Attribute Buffer"),
            contents: bytemuck::cast_slice(&attributes),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let camera = PerspectiveCamera::new(render_config, width, height);
        let uniforms = build_uniforms(&camera, render_config, &config, Vec2::ZERO);

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3, // position
                        }],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<PointAttributes>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[
                            wgpu::VertexAttribute {
                                offset: 0,
                                shader_location: 1,
                                format: wgpu::VertexFormat::Float32x3, // color
                            },
                            wgpu::VertexAttribute {
                                offset: 12,
                                shader_location: 2,
                                format: wgpu::VertexFormat::Float32, // size
                            },
                        ],
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(render_config.blend.to_blend_state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // No depth buffer: blended points never occlude each other
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        info!(
            adapter = %adapter.get_info().name,
            format = ?surface_format,
            ?alpha_mode,
            sample_count,
            particles = num_particles,
            "GPU surface created"
        );

        Ok(Self {
            resources: Some(GpuResources {
                surface,
                device,
                queue,
                config,
                render_pipeline,
                uniform_buffer,
                uniform_bind_group,
                position_buffer,
                attribute_buffer,
                sample_count,
                msaa_texture,
            }),
            camera,
            render_config: render_config.clone(),
            num_particles,
            staging,
            positions_dirty: false,
        })
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Current output size in pixels, or `None` after teardown.
    pub fn size(&self) -> Option<UVec2> {
        self.resources
            .as_ref()
            .map(|r| UVec2::new(r.config.width, r.config.height))
    }
}

impl RenderSurface for GpuSurface {
    fn resize(&mut self, size: UVec2) {
        let Some(res) = self.resources.as_mut() else {
            debug!("resize after teardown ignored");
            return;
        };
        if size.x == 0 || size.y == 0 {
            return;
        }
        res.config.width = size.x;
        res.config.height = size.y;
        res.surface.configure(&res.device, &res.config);
        if let Some((texture, _)) = res.msaa_texture.take() {
            texture.destroy();
        }
        res.msaa_texture = create_msaa_texture(&res.device, &res.config, res.sample_count);
        self.camera.set_viewport(size.x, size.y);
    }

    fn upload_positions(&mut self, particles: &[Particle]) {
        if self.resources.is_none() || particles.len() != self.num_particles as usize {
            return;
        }
        self.staging.clear();
        self.staging.extend(particles.iter().map(|p| p.position.to_array()));
        self.positions_dirty = true;
    }

    fn render(&mut self, rotation: Vec2) -> Result<(), RenderError> {
        let Some(res) = self.resources.as_ref() else {
            return Err(RenderError::Released);
        };

        let uniforms = build_uniforms(&self.camera, &self.render_config, &res.config, rotation);
        res.queue
            .write_buffer(&res.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        if self.positions_dirty && self.num_particles > 0 {
            res.queue
                .write_buffer(&res.position_buffer, 0, bytemuck::cast_slice(&self.staging));
            self.positions_dirty = false;
        }

        let output = res.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (target, resolve_target) = match &res.msaa_texture {
            Some((_, msaa_view)) => (msaa_view, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = res
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Points Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if self.num_particles > 0 {
                render_pass.set_pipeline(&res.render_pipeline);
                render_pass.set_bind_group(0, &res.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, res.position_buffer.slice(..));
                render_pass.set_vertex_buffer(1, res.attribute_buffer.slice(..));
                render_pass.draw(0..6, 0..self.num_particles);
            }
        }

        res.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn teardown(&mut self) {
        let Some(res) = self.resources.take() else {
            return;
        };
        res.position_buffer.destroy();
        res.attribute_buffer.destroy();
        res.uniform_buffer.destroy();
        if let Some((texture, _)) = &res.msaa_texture {
            texture.destroy();
        }
        self.staging = Vec::new();
        self.positions_dirty = false;
        drop(res);
        info!("GPU surface released");
    }

    fn is_released(&self) -> bool {
        self.resources.is_none()
    }
}

fn build_uniforms(
    camera: &PerspectiveCamera,
    render_config: &RenderConfig,
    config: &wgpu::SurfaceConfiguration,
    rotation: Vec2,
) -> Uniforms {
    let model = model_matrix(rotation);
    Uniforms {
        view_proj: camera.view_proj().to_cols_array_2d(),
        model: model.to_cols_array_2d(),
        viewport: [config.width as f32, config.height as f32],
        point_size: render_config.point_size,
        opacity: render_config.opacity,
        size_attenuation: render_config.size_attenuation as u32,
        _padding: [0; 3],
    }
}

/// Whole-field rotation: about X first, then about Y (Euler XYZ order).
fn model_matrix(rotation: Vec2) -> Mat4 {
    Mat4::from_rotation_x(rotation.x) * Mat4::from_rotation_y(rotation.y)
}

fn create_msaa_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<(wgpu::Texture, wgpu::TextureView)> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    Some((texture, view))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_matches_wgsl() {
        // mat4 + mat4 + vec2 + f32 + f32 + u32, rounded up to 16 bytes
        assert_eq!(std::mem::size_of::<Uniforms>(), 160);
        assert_eq!(std::mem::size_of::<PointAttributes>(), 16);
    }

    #[test]
    fn test_points_shader_validates() {
        let module = naga::front::wgsl::parse_str(SHADER_SOURCE).expect("WGSL should parse");
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        );
        validator.validate(&module).expect("WGSL should validate");
        assert!(module.entry_points.iter().any(|ep| ep.name == "vs_main"));
        assert!(module.entry_points.iter().any(|ep| ep.name == "fs_main"));
    }

    #[test]
    fn test_model_matrix() {
        assert!(model_matrix(Vec2::ZERO).abs_diff_eq(Mat4::IDENTITY, 1e-6));

        // Pure Y rotation by a quarter turn sends +X to -Z
        let m = model_matrix(Vec2::new(0.0, std::f32::consts::FRAC_PI_2));
        let p = m.transform_point3(glam::Vec3::X);
        assert!(p.abs_diff_eq(glam::Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }
}
