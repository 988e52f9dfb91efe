use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::visual::formations::{helix_targets, scatter_positions, sphere_targets, PARTICLE_COUNT};
use crate::visual::VisualState;

use super::feedback::{FeedbackCompositor, ACCUMULATION_FORMAT};
use super::{ParticleVertex, QuadVertex, PipelineDesc, ShaderManager, VertexBuffer};

/// The full uniform set every pass sees: elapsed time, the shaped control
/// signals, both blend weights and the viewport resolution. Each shader
/// reads the weight for its own layer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub time: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub trail_weight: f32,
    pub particle_weight: f32,
    pub resolution: [f32; 2],
}

pub struct GraphicsEngine<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    shader_manager: ShaderManager,
    compositor: FeedbackCompositor,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    quad_buffer: VertexBuffer,
    particle_buffer: VertexBuffer,
}

impl<'a> GraphicsEngine<'a> {
    pub async fn new(window: &'a Window) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
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
            .ok_or_else(|| anyhow::anyhow!("Failed to find an appropriate adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
                label: Some("uniform_bind_group_layout"),
            });

        let uniforms = Uniforms {
            time: 0.0,
            bass: 0.0,
            mid: 0.0,
            treble: 0.0,
            trail_weight: 1.0,
            particle_weight: 1.0,
            resolution: [config.width as f32, config.height as f32],
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let compositor = FeedbackCompositor::new(&device, config.width, config.height);

        let mut shader_manager = ShaderManager::new();
        shader_manager.load_shader(&device, "trail", include_str!("../../shaders/trail.wgsl"))?;
        shader_manager.load_shader(&device, "composite", include_str!("../../shaders/composite.wgsl"))?;
        shader_manager.load_shader(&device, "particles", include_str!("../../shaders/particles.wgsl"))?;

        // Feedback pass: previous accumulation in, next accumulation out.
        shader_manager.create_pipeline(
            &device,
            "trail",
            &PipelineDesc {
                shader: "trail",
                format: ACCUMULATION_FORMAT,
                bind_group_layouts: &[&uniform_bind_group_layout, compositor.bind_group_layout()],
                vertex_layout: QuadVertex::desc(),
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
            },
        )?;

        // Trail layer onto the visible surface.
        shader_manager.create_pipeline(
            &device,
            "composite",
            &PipelineDesc {
                shader: "composite",
                format: surface_format,
                bind_group_layouts: &[&uniform_bind_group_layout, compositor.bind_group_layout()],
                vertex_layout: QuadVertex::desc(),
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::REPLACE,
            },
        )?;

        // Particle layer: additive, depth-unwritten, so bright points
        // accumulate over the trail instead of occluding it.
        shader_manager.create_pipeline(
            &device,
            "particles",
            &PipelineDesc {
                shader: "particles",
                format: surface_format,
                bind_group_layouts: &[&uniform_bind_group_layout],
                vertex_layout: ParticleVertex::desc(),
                topology: wgpu::PrimitiveTopology::PointList,
                blend: wgpu::BlendState {
                    color: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::SrcAlpha,
                        dst_factor: wgpu::BlendFactor::One,
                        operation: wgpu::BlendOperation::Add,
                    },
                    alpha: wgpu::BlendComponent::REPLACE,
                },
            },
        )?;

        let quad_buffer = VertexBuffer::new(&device, &Self::create_fullscreen_quad());
        let particle_buffer = VertexBuffer::new(&device, &Self::create_particles());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            shader_manager,
            compositor,
            uniform_buffer,
            uniform_bind_group,
            quad_buffer,
            particle_buffer,
        })
    }

    fn create_fullscreen_quad() -> Vec<QuadVertex> {
        vec![
            QuadVertex { position: [-1.0, -1.0, 0.0], tex_coords: [0.0, 1.0] },
            QuadVertex { position: [1.0, -1.0, 0.0], tex_coords: [1.0, 1.0] },
            QuadVertex { position: [1.0, 1.0, 0.0], tex_coords: [1.0, 0.0] },
            QuadVertex { position: [-1.0, -1.0, 0.0], tex_coords: [0.0, 1.0] },
            QuadVertex { position: [1.0, 1.0, 0.0], tex_coords: [1.0, 0.0] },
            QuadVertex { position: [-1.0, 1.0, 0.0], tex_coords: [0.0, 0.0] },
        ]
    }

    /// Formation targets are generated once here and live immutably in the
    /// vertex buffer for the life of the program.
    fn create_particles() -> Vec<ParticleVertex> {
        let mut rng = rand::rng();
        let seeds = scatter_positions(PARTICLE_COUNT, &mut rng);
        let spheres = sphere_targets(PARTICLE_COUNT);
        let helices = helix_targets(PARTICLE_COUNT);

        seeds
            .iter()
            .zip(spheres.iter())
            .zip(helices.iter())
            .map(|((seed, sphere), helix)| ParticleVertex {
                position: seed.to_array(),
                sphere_target: sphere.to_array(),
                helix_target: helix.to_array(),
            })
            .collect()
    }

    /// Applied between ticks only: the swapchain and both accumulation
    /// surfaces change together or not at all.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.compositor.resize(&self.device, new_size.width, new_size.height);
        }
    }

    pub fn render(&mut self, state: &VisualState) -> Result<()> {
        debug_assert_eq!(
            self.compositor.dimensions(),
            (self.config.width, self.config.height),
            "accumulation surfaces out of step with the swapchain"
        );

        let weights = state.modes.weights();
        let uniforms = Uniforms {
            time: state.time,
            bass: state.signals.bass,
            mid: state.signals.mid,
            treble: state.signals.treble,
            trail_weight: weights.trail,
            particle_weight: weights.particle,
            resolution: [self.config.width as f32, self.config.height as f32],
        };

        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        // Feedback step: the trail layer reads last tick's accumulation and
        // writes this tick's.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Trail Feedback Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.compositor.write_target().view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.shader_manager.get_pipeline("trail") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_bind_group(1, &self.compositor.read_source().bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.quad_buffer.buffer.slice(..));
                render_pass.draw(0..self.quad_buffer.vertex_count, 0..1);
            }
        }

        // Visible composite: trail layer first, then the particle overlay.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Composite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.shader_manager.get_pipeline("composite") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_bind_group(1, &self.compositor.write_target().bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.quad_buffer.buffer.slice(..));
                render_pass.draw(0..self.quad_buffer.vertex_count, 0..1);
            }
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.shader_manager.get_pipeline("particles") {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.particle_buffer.buffer.slice(..));
                render_pass.draw(0..self.particle_buffer.vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.compositor.swap();

        Ok(())
    }
}
