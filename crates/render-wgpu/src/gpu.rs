use crate::mesh::{self, GeometryKey, Vertex};
use crate::shaders::{self, MAX_LIGHTS};
use bytemuck::{Pod, Zeroable};
use orbitview_common::Color;
use orbitview_render::{Camera, RenderError, Renderer, SurfaceSize};
use orbitview_scene::{Drawable, SceneGraph};
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MSAA_SAMPLES: u32 = 4;
const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

/// Errors while acquiring a GPU and a surface to present to.
#[derive(Debug, thiserror::Error)]
pub enum GpuInitError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    UnsupportedSurface,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GpuLight {
    position: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_count: [u32; 4],
    lights: [GpuLight; MAX_LIGHTS],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    material: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// wgpu-backed [`Renderer`] presenting to a window surface.
///
/// Meshes are tessellated once per distinct geometry and drawn instanced,
/// one draw call per geometry.
pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
    meshes: BTreeMap<GeometryKey, GpuMesh>,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
    msaa_supported: bool,
    sample_count: u32,
    device_lost: Arc<AtomicBool>,
    warned_light_overflow: bool,
    encode_srgb: bool,
}

impl WgpuRenderer {
    /// Acquire an adapter and device for `target` and configure its surface
    /// at `width` x `height`. Antialiasing starts off until [`Renderer::configure`].
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, GpuInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuInitError::NoAdapter)?;
        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter selected");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("orbitview_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let device_lost = Arc::new(AtomicBool::new(false));
        let flag = device_lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            tracing::error!(?reason, %message, "GPU device lost");
            flag.store(true, Ordering::SeqCst);
        });

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(GpuInitError::UnsupportedSurface)?;
        let encode_srgb = shader_encodes_srgb(format);
        if encode_srgb {
            tracing::warn!(?format, "no sRGB surface format; encoding colors in the shader");
        }
        let msaa_supported = adapter
            .get_texture_format_features(format)
            .flags
            .sample_count_supported(MSAA_SAMPLES);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_buffer"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bind_group_layout"),
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

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let sample_count = 1;
        let pipeline = create_pipeline(&device, &pipeline_layout, &shader, format, sample_count);

        let instance_capacity = 64;
        let instance_buffer = create_instance_buffer(&device, instance_capacity);
        let depth_view = create_depth_texture(&device, &config, sample_count);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            shader,
            pipeline_layout,
            pipeline,
            globals_buffer,
            globals_bind_group,
            instance_buffer,
            instance_capacity,
            meshes: BTreeMap::new(),
            depth_view,
            msaa_view: None,
            msaa_supported,
            sample_count,
            device_lost,
            warned_light_overflow: false,
            encode_srgb,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn ensure_mesh(&mut self, key: GeometryKey, geometry: &orbitview_scene::Geometry) {
        if self.meshes.contains_key(&key) {
            return;
        }
        let data = mesh::tessellate(geometry);
        tracing::debug!(
            kind = geometry.kind(),
            vertices = data.vertices.len(),
            triangles = data.indices.len() / 3,
            "uploading mesh"
        );
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.insert(
            key,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: data.indices.len() as u32,
            },
        );
    }

    fn ensure_instance_capacity(&mut self, needed: u64) {
        if needed <= self.instance_capacity {
            return;
        }
        self.instance_capacity = needed.next_power_of_two();
        self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
    }

    /// Rebuild size- and sample-count-dependent attachments.
    fn rebuild_targets(&mut self) {
        self.depth_view = create_depth_texture(&self.device, &self.config, self.sample_count);
        self.msaa_view = (self.sample_count > 1)
            .then(|| create_msaa_texture(&self.device, &self.config, self.sample_count));
    }

    fn globals(&mut self, scene: &SceneGraph, camera: &Camera) -> Globals {
        let mut globals = Globals::zeroed();
        globals.view_proj = camera.view_projection().to_cols_array_2d();
        globals.camera_position = camera.position.extend(1.0).to_array();

        let mut count = 0;
        for light in scene.lights() {
            if count == MAX_LIGHTS {
                if !self.warned_light_overflow {
                    tracing::warn!(max = MAX_LIGHTS, "too many point lights; extra lights ignored");
                    self.warned_light_overflow = true;
                }
                break;
            }
            let [r, g, b] = linear(light.light.color);
            let intensity = light.light.intensity();
            globals.lights[count] = GpuLight {
                position: light.position.extend(1.0).to_array(),
                color: [r * intensity, g * intensity, b * intensity, 1.0],
                params: [light.light.distance(), light.light.decay(), 0.0, 0.0],
            };
            count += 1;
        }
        globals.light_count = [count as u32, self.encode_srgb as u32, 0, 0];
        globals
    }
}

impl Renderer for WgpuRenderer {
    fn configure(&mut self, surface: SurfaceSize, antialias: bool) {
        let sample_count = if antialias && self.msaa_supported {
            MSAA_SAMPLES
        } else {
            1
        };
        if antialias && !self.msaa_supported {
            tracing::warn!(format = ?self.config.format, "4x MSAA unsupported; antialiasing disabled");
        }
        self.config.width = surface.width;
        self.config.height = surface.height;
        self.surface.configure(&self.device, &self.config);

        if sample_count != self.sample_count {
            self.sample_count = sample_count;
            self.pipeline = create_pipeline(
                &self.device,
                &self.pipeline_layout,
                &self.shader,
                self.config.format,
                sample_count,
            );
        }
        self.rebuild_targets();
        tracing::debug!(
            width = surface.width,
            height = surface.height,
            samples = self.sample_count,
            "surface configured"
        );
    }

    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError> {
        if self.device_lost.load(Ordering::SeqCst) {
            return Err(RenderError::ContextLost("GPU device lost".into()));
        }

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout; skipping frame");
                return Ok(());
            }
            Err(err) => return Err(RenderError::ContextLost(err.to_string())),
        };

        let globals = self.globals(scene, camera);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        // Group mesh instances by geometry.
        let mut groups: BTreeMap<GeometryKey, Vec<InstanceData>> = BTreeMap::new();
        for visit in scene.traverse() {
            let Drawable::Mesh { geometry, material } = &visit.node.drawable else {
                continue;
            };
            let key = GeometryKey::of(geometry);
            self.ensure_mesh(key, geometry);
            let cols = visit.world.to_cols_array_2d();
            let [r, g, b] = linear(material.color);
            groups.entry(key).or_default().push(InstanceData {
                model_0: cols[0],
                model_1: cols[1],
                model_2: cols[2],
                model_3: cols[3],
                color: [r, g, b, 1.0],
                material: [material.roughness(), material.metalness(), 0.0, 0.0],
            });
        }

        let mut instances = Vec::new();
        let mut batches: Vec<(GeometryKey, Range<u32>)> = Vec::with_capacity(groups.len());
        for (key, group) in groups {
            let start = instances.len() as u32;
            instances.extend(group);
            batches.push((key, start..instances.len() as u32));
        }
        if !instances.is_empty() {
            self.ensure_instance_capacity(instances.len() as u64);
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (target, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (key, range) in &batches {
                let Some(mesh) = self.meshes.get(key) else {
                    continue;
                };
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, range.clone());
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

/// Shading happens in linear space. sRGB targets encode on write and float
/// targets are composited as linear; plain UNORM targets need the fragment
/// shader to encode.
fn shader_encodes_srgb(format: wgpu::TextureFormat) -> bool {
    use wgpu::TextureFormat::*;
    matches!(format, Bgra8Unorm | Rgba8Unorm | Rgb10a2Unorm)
}

/// Hex colors are sRGB-encoded; shading happens in linear space.
fn linear(color: Color) -> [f32; 3] {
    color.to_array().map(|c| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    sample_count: u32,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x4,
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                        6 => Float32x4,
                        7 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}

fn create_instance_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: capacity * std::mem::size_of::<InstanceData>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn create_msaa_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
