//! Headless wgpu backend.
//!
//! Renders batches into an offscreen color target, which keeps the backend
//! free of any windowing dependency. Pipelines are cached per attribute
//! combination; every combination compiles a small generated WGSL shader
//! that reads the fixed attribute slots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::BatchError;
use crate::layout::{VertexAttributeSemantic, VertexLayout};
use crate::types::{BufferDescriptor, BufferUsage, IndexFormat, COPY_ALIGNMENT};

use super::{GpuBackend, GpuBuffer, GpuVertexArray, VertexArrayDescriptor};

/// Side length of the offscreen color target.
const TARGET_SIZE: u32 = 256;

/// Format of the offscreen color target.
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Pipeline cache key: which optional attributes the layout carries.
type PipelineKey = (bool, bool);

/// Headless wgpu backend.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: wgpu::TextureView,
    pipelines: Mutex<HashMap<PipelineKey, Arc<wgpu::RenderPipeline>>>,
}

impl WgpuBackend {
    /// Create a backend on the first available adapter.
    ///
    /// Fails with [`BatchError::Backend`] when no adapter or device is
    /// available, letting callers fall back to the dummy backend.
    pub fn new() -> Result<Self, BatchError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or_else(|| BatchError::Backend("no compatible GPU adapter found".into()))?;

        log::debug!("WgpuBackend: using adapter {:?}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tribatch device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .map_err(|e| BatchError::Backend(format!("device request failed: {e}")))?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tribatch color target"),
            size: wgpu::Extent3d {
                width: TARGET_SIZE,
                height: TARGET_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let target = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            device,
            queue,
            target,
            pipelines: Mutex::new(HashMap::new()),
        })
    }

    fn pipeline_for(&self, layout: &VertexLayout) -> Result<Arc<wgpu::RenderPipeline>, BatchError> {
        let key = (
            layout.has_semantic(VertexAttributeSemantic::Normal),
            layout.has_semantic(VertexAttributeSemantic::TexCoord0),
        );

        let mut pipelines = self
            .pipelines
            .lock()
            .map_err(|_| BatchError::Backend("pipeline cache poisoned".into()))?;
        if let Some(pipeline) = pipelines.get(&key) {
            return Ok(pipeline.clone());
        }

        let source = shader_source(key.0, key.1);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("tribatch shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("tribatch pipeline layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        // One tightly packed buffer per attribute, bound at its fixed slot.
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = layout
            .attributes
            .iter()
            .map(|attr| {
                [wgpu::VertexAttribute {
                    format: map_vertex_format(attr.format),
                    offset: 0,
                    shader_location: attr.semantic.slot(),
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = layout
            .attributes
            .iter()
            .zip(&attributes)
            .map(|(attr, attrs)| wgpu::VertexBufferLayout {
                array_stride: attr.format.size() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("tribatch pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: "vs_main",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: "fs_main",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        let pipeline = Arc::new(pipeline);
        pipelines.insert(key, pipeline.clone());
        Ok(pipeline)
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "Wgpu"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, BatchError> {
        log::trace!(
            "WgpuBackend: creating buffer {:?} (size: {})",
            descriptor.label,
            descriptor.size
        );
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage: map_usage(descriptor.usage),
            mapped_at_creation: false,
        });
        Ok(GpuBuffer::Wgpu(Arc::new(buffer)))
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), BatchError> {
        let GpuBuffer::Wgpu(buffer) = buffer else {
            return Err(BatchError::Backend(
                "buffer belongs to another backend".into(),
            ));
        };
        if data.is_empty() {
            return Ok(());
        }
        self.queue.write_buffer(buffer, offset, data);
        Ok(())
    }

    fn read_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, BatchError> {
        let GpuBuffer::Wgpu(buffer) = buffer else {
            return Err(BatchError::Backend(
                "buffer belongs to another backend".into(),
            ));
        };
        if size == 0 {
            return Ok(Vec::new());
        }
        if offset % COPY_ALIGNMENT != 0 || size % COPY_ALIGNMENT != 0 {
            return Err(BatchError::Backend(format!(
                "read of {size} bytes at offset {offset} violates copy alignment"
            )));
        }

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tribatch readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tribatch readback"),
            });
        encoder.copy_buffer_to_buffer(buffer, offset, &staging, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);

        receiver
            .recv()
            .map_err(|_| BatchError::Backend("buffer map callback dropped".into()))?
            .map_err(|e| BatchError::Backend(format!("buffer map failed: {e}")))?;

        let data = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(data)
    }

    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor,
    ) -> Result<GpuVertexArray, BatchError> {
        if descriptor.vertex_buffers.len() != descriptor.layout.buffer_count() {
            return Err(BatchError::Backend(format!(
                "vertex array has {} buffers but the layout expects {}",
                descriptor.vertex_buffers.len(),
                descriptor.layout.buffer_count()
            )));
        }

        let mut vertex_buffers = Vec::with_capacity(descriptor.vertex_buffers.len());
        for buffer in &descriptor.vertex_buffers {
            let GpuBuffer::Wgpu(buffer) = buffer else {
                return Err(BatchError::Backend(
                    "buffer belongs to another backend".into(),
                ));
            };
            vertex_buffers.push(buffer.clone());
        }
        let GpuBuffer::Wgpu(index_buffer) = &descriptor.index_buffer else {
            return Err(BatchError::Backend(
                "buffer belongs to another backend".into(),
            ));
        };

        Ok(GpuVertexArray::Wgpu {
            vertex_buffers,
            index_buffer: index_buffer.clone(),
            index_format: descriptor.index_format,
            layout: descriptor.layout.clone(),
        })
    }

    fn draw_indexed(
        &self,
        vertex_array: &GpuVertexArray,
        index_count: u32,
    ) -> Result<(), BatchError> {
        let GpuVertexArray::Wgpu {
            vertex_buffers,
            index_buffer,
            index_format,
            layout,
        } = vertex_array
        else {
            return Err(BatchError::Backend(
                "vertex array belongs to another backend".into(),
            ));
        };

        let pipeline = self.pipeline_for(layout)?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("tribatch draw"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tribatch pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target,
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

            pass.set_pipeline(&pipeline);
            for (slot, buffer) in vertex_buffers.iter().enumerate() {
                pass.set_vertex_buffer(slot as u32, buffer.slice(..));
            }
            pass.set_index_buffer(index_buffer.slice(..), map_index_format(*index_format));
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

fn map_usage(usage: BufferUsage) -> wgpu::BufferUsages {
    let mut result = wgpu::BufferUsages::empty();
    if usage.contains(BufferUsage::VERTEX) {
        result |= wgpu::BufferUsages::VERTEX;
    }
    if usage.contains(BufferUsage::INDEX) {
        result |= wgpu::BufferUsages::INDEX;
    }
    if usage.contains(BufferUsage::COPY_SRC) {
        result |= wgpu::BufferUsages::COPY_SRC;
    }
    if usage.contains(BufferUsage::COPY_DST) {
        result |= wgpu::BufferUsages::COPY_DST;
    }
    if usage.contains(BufferUsage::MAP_READ) {
        result |= wgpu::BufferUsages::MAP_READ;
    }
    result
}

fn map_index_format(format: IndexFormat) -> wgpu::IndexFormat {
    match format {
        IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
    }
}

fn map_vertex_format(format: crate::layout::VertexAttributeFormat) -> wgpu::VertexFormat {
    match format {
        crate::layout::VertexAttributeFormat::Float2 => wgpu::VertexFormat::Float32x2,
        crate::layout::VertexAttributeFormat::Float3 => wgpu::VertexFormat::Float32x3,
    }
}

/// Generate the WGSL for an attribute combination.
///
/// Positions are passed straight through to clip space; the fragment color
/// comes from the richest attribute present so that every combination stays
/// visually distinguishable while debugging.
fn shader_source(has_normal: bool, has_texcoord: bool) -> String {
    let mut inputs = String::from("@location(0) position: vec3<f32>");
    if has_normal {
        inputs.push_str(", @location(1) normal: vec3<f32>");
    }
    if has_texcoord {
        inputs.push_str(", @location(2) texcoord: vec2<f32>");
    }
    let color = if has_normal {
        "normal * 0.5 + vec3<f32>(0.5, 0.5, 0.5)"
    } else if has_texcoord {
        "vec3<f32>(texcoord, 0.0)"
    } else {
        "vec3<f32>(1.0, 1.0, 1.0)"
    };

    format!(
        r#"struct VsOut {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
}};

@vertex
fn vs_main({inputs}) -> VsOut {{
    var out: VsOut;
    out.clip_position = vec4<f32>(position, 1.0);
    out.color = {color};
    return out;
}}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {{
    return vec4<f32>(in.color, 1.0);
}}
"#
    )
}
