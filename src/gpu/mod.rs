//! wgpu implementation of [`RenderTarget`].
//!
//! Two scenes share one surface. The volume scene draws translucent backdrop
//! planes and then the particle lattice, each particle an instanced quad whose
//! opacity comes from a separate per-instance buffer. The flat scene uploads
//! the pixel buffer into a texture and draws it full screen. Whichever scene
//! last received data is the one drawn.

mod shaders;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::SceneTransform;
use crate::config::ViewConfig;
use crate::error::GpuError;
use crate::pixels::PixelBuffer;
use crate::render::RenderTarget;

const PARTICLE_SIZE: f32 = 0.004;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    color: [f32; 4],
    plane_extent: [f32; 2],
    particle_size: f32,
    plane_opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scene {
    Flat,
    Volume,
}

struct FlatTexture {
    bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
    width: u32,
    height: u32,
}

/// Renders sessions to a window surface.
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    particle_pipeline: wgpu::RenderPipeline,
    plane_pipeline: wgpu::RenderPipeline,
    flat_pipeline: wgpu::RenderPipeline,
    flat_layout: wgpu::BindGroupLayout,
    flat_sampler: wgpu::Sampler,
    flat_texture: Option<FlatTexture>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    position_buffer: Option<wgpu::Buffer>,
    alpha_buffer: Option<wgpu::Buffer>,
    num_particles: u32,
    plane_buffer: wgpu::Buffer,
    num_planes: u32,
    uniforms: Uniforms,
    transform: Option<SceneTransform>,
    scene: Scene,
    surface_error: Option<wgpu::SurfaceError>,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>, view: &ViewConfig) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    ..Default::default()
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let [r, g, b] = view.brand_color;
        let uniforms = Uniforms {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            color: [f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0, 1.0],
            plane_extent: [0.0, 0.0],
            particle_size: PARTICLE_SIZE,
            plane_opacity: view.plane_opacity,
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
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

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Particles: position and alpha come from two per-instance buffers.
        let particle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::particle_source().into()),
        });
        let particle_pipeline = create_blended_pipeline(
            &device,
            "Particle Pipeline",
            &scene_layout,
            &particle_shader,
            &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<f32>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 1,
                        format: wgpu::VertexFormat::Float32,
                    }],
                },
            ],
            config.format,
        );

        // Backdrop planes: one instance per plane, carrying its Z offset.
        let plane_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Plane Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::plane_source().into()),
        });
        let plane_pipeline = create_blended_pipeline(
            &device,
            "Plane Pipeline",
            &scene_layout,
            &plane_shader,
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<f32>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32,
                }],
            }],
            config.format,
        );

        let half = view.background_planes as f32 / 2.0;
        let plane_offsets: Vec<f32> = (0..view.background_planes)
            .map(|i| (i as f32 - half) * view.plane_spacing)
            .collect();
        // wgpu rejects zero-sized vertex buffers.
        let plane_contents: &[f32] = if plane_offsets.is_empty() { &[0.0] } else { &plane_offsets };
        let plane_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Plane Buffer"),
            contents: bytemuck::cast_slice(plane_contents),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Flat view: sampled texture on a full-screen triangle.
        let flat_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Flat Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let flat_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flat Pipeline Layout"),
            bind_group_layouts: &[&flat_layout],
            push_constant_ranges: &[],
        });
        let flat_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flat Shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::FLAT_SOURCE.into()),
        });
        let flat_pipeline =
            create_blended_pipeline(&device, "Flat Pipeline", &flat_pipeline_layout, &flat_shader, &[], config.format);
        let flat_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Flat Sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "GPU renderer ready: {}x{} {:?}, {} backdrop planes",
            config.width,
            config.height,
            config.format,
            view.background_planes
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            particle_pipeline,
            plane_pipeline,
            flat_pipeline,
            flat_layout,
            flat_sampler,
            flat_texture: None,
            uniform_buffer,
            uniform_bind_group,
            position_buffer: None,
            alpha_buffer: None,
            num_particles: 0,
            plane_buffer,
            num_planes: view.background_planes,
            uniforms,
            transform: None,
            scene: Scene::Volume,
            surface_error: None,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// The last error from [`RenderTarget::render_frame`], if not yet handled.
    pub fn take_surface_error(&mut self) -> Option<wgpu::SurfaceError> {
        self.surface_error.take()
    }

    /// Reconfigure the surface at its current size, after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn update_uniforms(&mut self) {
        if let Some(transform) = &self.transform {
            let aspect = self.config.width as f32 / self.config.height.max(1) as f32;
            self.uniforms.view_proj = transform.view_proj_model(aspect).to_cols_array_2d();
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[self.uniforms]));
    }

    fn ensure_flat_texture(&mut self, width: u32, height: u32) {
        let stale = self
            .flat_texture
            .as_ref()
            .map_or(true, |t| t.width != width || t.height != height);
        if stale {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Flat Texture"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Flat Bind Group"),
                layout: &self.flat_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.flat_sampler),
                    },
                ],
            });
            self.flat_texture = Some(FlatTexture {
                bind_group,
                texture,
                width,
                height,
            });
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.update_uniforms();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            match self.scene {
                Scene::Flat => {
                    if let Some(flat) = &self.flat_texture {
                        render_pass.set_pipeline(&self.flat_pipeline);
                        render_pass.set_bind_group(0, &flat.bind_group, &[]);
                        render_pass.draw(0..3, 0..1);
                    }
                }
                Scene::Volume => {
                    render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                    if self.num_planes > 0 {
                        render_pass.set_pipeline(&self.plane_pipeline);
                        render_pass.set_vertex_buffer(0, self.plane_buffer.slice(..));
                        render_pass.draw(0..6, 0..self.num_planes);
                    }
                    if let (Some(positions), Some(alphas)) = (&self.position_buffer, &self.alpha_buffer) {
                        render_pass.set_pipeline(&self.particle_pipeline);
                        render_pass.set_vertex_buffer(0, positions.slice(..));
                        render_pass.set_vertex_buffer(1, alphas.slice(..));
                        render_pass.draw(0..6, 0..self.num_particles);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl RenderTarget for GpuRenderer {
    type Error = wgpu::SurfaceError;

    fn upload_particles(&mut self, positions: &[Vec3]) {
        self.scene = Scene::Volume;
        self.num_particles = positions.len() as u32;
        if positions.is_empty() {
            self.position_buffer = None;
            self.alpha_buffer = None;
            return;
        }

        let raw: Vec<[f32; 3]> = positions.iter().map(|p| p.to_array()).collect();
        self.position_buffer = Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Position Buffer"),
            contents: bytemuck::cast_slice(&raw),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.alpha_buffer = Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Alpha Buffer"),
            contents: bytemuck::cast_slice(&vec![0.0f32; positions.len()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        }));

        // Planes span the lattice footprint.
        let extent = positions
            .iter()
            .fold(glam::Vec2::ZERO, |acc, p| acc.max(p.truncate().abs()));
        self.uniforms.plane_extent = extent.to_array();
    }

    fn update_opacity(&mut self, alphas: &[f32]) {
        self.scene = Scene::Volume;
        match &self.alpha_buffer {
            Some(buffer) if alphas.len() as u32 == self.num_particles => {
                self.queue.write_buffer(buffer, 0, bytemuck::cast_slice(alphas));
            }
            _ => log::warn!(
                "opacity update for {} particles, lattice has {}",
                alphas.len(),
                self.num_particles
            ),
        }
    }

    fn write_pixels(&mut self, pixels: &PixelBuffer) {
        self.scene = Scene::Flat;
        let (width, height) = (pixels.width() as u32, pixels.height() as u32);
        if width == 0 || height == 0 {
            return;
        }
        self.ensure_flat_texture(width, height);
        let Some(flat) = &self.flat_texture else {
            return;
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &flat.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn set_camera_transform(&mut self, transform: &SceneTransform) {
        self.transform = Some(*transform);
    }

    fn render_frame(&mut self) -> Result<(), Self::Error> {
        self.render().inspect_err(|e| self.surface_error = Some(e.clone()))
    }
}

fn create_blended_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
