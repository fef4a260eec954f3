//! wgpu backend for [`Canvas`]: every stroke and rectangle becomes one instance of an SDF-shaded
//! quad, all drawn in a single instanced draw call.
//!
//! A stroke's instance covers its whole polyline, whose points live in a separate storage buffer.
//! The shader takes the distance to the nearest segment, so overlapping segments and caps of the
//! same stroke are blended once.

use std::mem;

use anyhow::{bail, Context};
use bytemuck::NoUninit;
use wgpu::{
    Adapter, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, BlendState,
    Buffer, BufferBindingType, BufferDescriptor, BufferUsages, Color, ColorTargetState,
    ColorWrites, CommandEncoder, CompositeAlphaMode, Device, DeviceDescriptor, FragmentState,
    LoadOp, MemoryHints, MultisampleState, Operations, PipelineCompilationOptions,
    PipelineLayoutDescriptor, PrimitiveState, PrimitiveTopology, Queue, RenderPass,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    RequestAdapterOptions, ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface,
    SurfaceConfiguration, Texture, TextureFormat, VertexState,
};

use crate::{
    canvas::{Canvas, LineStyle},
    color::Rgba,
    math::{vec2, Rect, Vec2f},
};

/// The overlay is composited over the desktop, so the surface must honor our alpha.
pub const ALPHA_MODE: CompositeAlphaMode = CompositeAlphaMode::PreMultiplied;

const SHAPE_POLYLINE: u32 = 0;
const SHAPE_ROUNDED_RECT: u32 = 1;

pub struct Gpu {
    adapter: Adapter,
    device: Device,
    queue: Queue,
    /// Format of the window surface, used as the format of every render target.
    format: TextureFormat,

    render_pipeline: RenderPipeline,

    uniforms_bgl: BindGroupLayout,
    geometry_bgl: BindGroupLayout,
}

impl Gpu {
    pub fn new(instance: &wgpu::Instance, surface: &Surface<'_>) -> anyhow::Result<Self> {
        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            compatible_surface: Some(surface),
            ..Default::default()
        }))
        .context("failed to find a supported graphics adapter")?;

        let surface_caps = surface.get_capabilities(&adapter);
        if !surface_caps.alpha_modes.contains(&ALPHA_MODE) {
            bail!(
                "surface does not support required alpha compositing mode {:?} (supported: {:?})",
                ALPHA_MODE,
                surface_caps.alpha_modes,
            );
        }
        // Colors are blended in sRGB space, the way a 2D canvas does it.
        let Some(format) = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
        else {
            bail!("surface reports no supported texture formats");
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            label: Some("glowpen"),
            memory_hints: MemoryHints::MemoryUsage,
            ..Default::default()
        }))?;

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("shader"),
            source: ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let buffer_entry = |binding: u32, ty: BufferBindingType| BindGroupLayoutEntry {
            binding,
            count: None,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
        };
        let storage = BufferBindingType::Storage { read_only: true };
        let uniforms_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("uniforms"),
            entries: &[buffer_entry(0, BufferBindingType::Uniform)],
        });
        let geometry_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("geometry"),
            entries: &[buffer_entry(0, storage), buffer_entry(1, storage)],
        });

        let render_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("main_render_pipeline"),
            layout: Some(&device.create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some("main_render_pipeline"),
                bind_group_layouts: &[&uniforms_bgl, &geometry_bgl],
                ..Default::default()
            })),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vertex"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[],
            },
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fragment"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format,
                    blend: Some(BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: ColorWrites::all(),
                })],
            }),
            multiview: None,
            cache: None,
        });

        Ok(Gpu {
            adapter,
            device,
            queue,
            format,
            render_pipeline,
            uniforms_bgl,
            geometry_bgl,
        })
    }

    /// Surface configuration for a `width`x`height` window.
    pub fn surface_config(
        &self,
        surface: &Surface<'_>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<SurfaceConfiguration> {
        let mut config = surface
            .get_default_config(&self.adapter, width.max(1), height.max(1))
            .context("adapter does not support surface")?;
        config.format = self.format;
        config.alpha_mode = ALPHA_MODE;
        Ok(config)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}

#[derive(Clone, Copy, NoUninit)]
#[repr(C)]
struct Uniforms {
    render_target_size: [u32; 2],
    _padding: [u32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
#[repr(C)]
struct Instance {
    /// Bounding box of the polyline, or the rectangle itself.
    lo: Vec2f,
    hi: Vec2f,
    /// Premultiplied.
    color: [f32; 4],
    /// Half the line width, or the rectangle's corner radius.
    half_width: f32,
    blur: f32,
    shape: u32,
    /// Range of the polyline in the point buffer.
    first_point: u32,
    point_count: u32,
    _padding: [u32; 3],
}

/// Collects canvas commands as shader instances for the next frame.
#[derive(Default)]
pub struct GpuCanvas {
    instances: Vec<Instance>,
    points: Vec<Vec2f>,
}

impl Canvas for GpuCanvas {
    fn clear(&mut self) {
        self.instances.clear();
        self.points.clear();
    }

    fn stroke(&mut self, path: &[Vec2f], style: &LineStyle) {
        let Some(&first) = path.first() else { return };
        let (lo, hi) = path.iter().fold((first, first), |(lo, hi), p| {
            (
                vec2(lo.x.min(p.x), lo.y.min(p.y)),
                vec2(hi.x.max(p.x), hi.y.max(p.y)),
            )
        });

        let first_point = self.points.len() as u32;
        self.points.extend_from_slice(path);
        self.instances.push(Instance {
            lo,
            hi,
            color: style.color.premultiplied(),
            half_width: style.width * 0.5,
            blur: style.blur,
            shape: SHAPE_POLYLINE,
            first_point,
            point_count: path.len() as u32,
            _padding: [0; 3],
        });
    }

    fn fill_rect(&mut self, rect: Rect, corner_radius: f32, color: Rgba) {
        self.instances.push(Instance {
            lo: rect.min,
            hi: rect.max,
            color: color.premultiplied(),
            half_width: corner_radius,
            blur: 0.0,
            shape: SHAPE_ROUNDED_RECT,
            first_point: 0,
            point_count: 0,
            _padding: [0; 3],
        });
    }
}

pub struct Pass<'a> {
    gpu: &'a Gpu,
    pass: RenderPass<'a>,
}

impl<'a> Pass<'a> {
    /// Begins a pass that first clears `target` to transparent.
    pub fn new(gpu: &'a Gpu, enc: &'a mut CommandEncoder, target: &Texture) -> Self {
        let pass = enc.begin_render_pass(&RenderPassDescriptor {
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &target.create_view(&Default::default()),
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(Color::TRANSPARENT),
                    store: StoreOp::Store,
                },
            })],
            ..Default::default()
        });

        Self { gpu, pass }
    }
}

/// GPU buffers holding one frame's worth of canvas instances.
pub struct Batch {
    uniform_buf: Buffer,
    instance_buf: Buffer,
    point_buf: Buffer,
    uniforms_bg: BindGroup,
    geometry_bg: BindGroup,
    instance_count: u32,
}

impl Batch {
    pub fn new(gpu: &Gpu) -> Self {
        let uniform_buf = gpu.device.create_buffer(&BufferDescriptor {
            label: Some("uniforms"),
            size: mem::size_of::<Uniforms>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniforms_bg = gpu.device.create_bind_group(&BindGroupDescriptor {
            label: Some("uniforms"),
            layout: &gpu.uniforms_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::Buffer(uniform_buf.as_entire_buffer_binding()),
            }],
        });
        let instance_buf = Self::storage_buffer::<Instance>(gpu, "instances", 1);
        let point_buf = Self::storage_buffer::<Vec2f>(gpu, "points", 1);
        let geometry_bg = Self::geometry_bind_group(gpu, &instance_buf, &point_buf);

        Self {
            uniform_buf,
            instance_buf,
            point_buf,
            uniforms_bg,
            geometry_bg,
            instance_count: 0,
        }
    }

    fn storage_buffer<T>(gpu: &Gpu, label: &str, capacity: usize) -> Buffer {
        gpu.device.create_buffer(&BufferDescriptor {
            label: Some(label),
            size: (mem::size_of::<T>() * capacity) as u64,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn geometry_bind_group(gpu: &Gpu, instance_buf: &Buffer, point_buf: &Buffer) -> BindGroup {
        gpu.device.create_bind_group(&BindGroupDescriptor {
            label: Some("geometry"),
            layout: &gpu.geometry_bgl,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::Buffer(instance_buf.as_entire_buffer_binding()),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Buffer(point_buf.as_entire_buffer_binding()),
                },
            ],
        })
    }

    /// Uploads everything `canvas` collected, for drawing onto a target of `target_size` pixels.
    pub fn upload(&mut self, gpu: &Gpu, canvas: &GpuCanvas, target_size: [u32; 2]) {
        let GpuCanvas { instances, points } = canvas;

        // grow to the next power of two so a growing stroke doesn't reallocate every frame
        let mut grown = false;
        if self.instance_buf.size() < mem::size_of_val(instances.as_slice()) as u64 {
            self.instance_buf = Self::storage_buffer::<Instance>(
                gpu,
                "instances",
                instances.len().next_power_of_two(),
            );
            grown = true;
        }
        if self.point_buf.size() < mem::size_of_val(points.as_slice()) as u64 {
            self.point_buf =
                Self::storage_buffer::<Vec2f>(gpu, "points", points.len().next_power_of_two());
            grown = true;
        }
        if grown {
            self.geometry_bg = Self::geometry_bind_group(gpu, &self.instance_buf, &self.point_buf);
        }

        if !instances.is_empty() {
            gpu.queue
                .write_buffer(&self.instance_buf, 0, bytemuck::cast_slice(instances));
        }
        if !points.is_empty() {
            gpu.queue
                .write_buffer(&self.point_buf, 0, bytemuck::cast_slice(points));
        }
        self.instance_count = instances.len() as u32;

        let uniforms = Uniforms {
            render_target_size: target_size,
            _padding: [0; 2],
        };
        gpu.queue
            .write_buffer(&self.uniform_buf, 0, bytemuck::bytes_of(&uniforms));
    }

    pub fn draw(&self, p: &mut Pass<'_>) {
        if self.instance_count == 0 {
            return;
        }
        p.pass.set_pipeline(&p.gpu.render_pipeline);
        p.pass.set_bind_group(0, &self.uniforms_bg, &[]);
        p.pass.set_bind_group(1, &self.geometry_bg, &[]);
        p.pass.draw(0..4, 0..self.instance_count);
    }
}
