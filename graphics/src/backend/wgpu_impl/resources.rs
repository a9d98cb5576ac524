//! Texture and program creation for the wgpu backend.

use crate::error::GraphicsError;
use crate::shader::{FRAGMENT_ENTRY, ProgramKind, VERTEX_ENTRY};
use crate::types::{TextureDescriptor, TextureDimension};

use super::super::{GpuProgram, GpuTexture};
use super::WgpuBackend;
use super::conversion::{
    convert_sampler, convert_texture_format, convert_texture_usage, convert_view_dimension,
};

/// View of a single `(layer, mip)` level as a 2D texture.
pub(super) fn level_view(texture: &wgpu::Texture, layer: u32, mip: u32) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Level View"),
        dimension: Some(wgpu::TextureViewDimension::D2),
        base_mip_level: mip,
        mip_level_count: Some(1),
        base_array_layer: layer,
        array_layer_count: Some(1),
        ..Default::default()
    })
}

pub(super) fn wgpu_texture(texture: &GpuTexture) -> Result<&wgpu::Texture, GraphicsError> {
    match texture {
        GpuTexture::Wgpu { texture, .. } => Ok(texture),
        _ => Err(GraphicsError::Internal(
            "wgpu backend received a non-wgpu texture".to_string(),
        )),
    }
}

impl WgpuBackend {
    /// Create a texture resource with a full view and its sampler.
    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<GpuTexture, GraphicsError> {
        let format = convert_texture_format(descriptor.format);
        let usage = convert_texture_usage(descriptor.usage);

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: wgpu::Extent3d {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth_or_array_layers: descriptor.layer_count(),
            },
            mip_level_count: descriptor.mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(convert_view_dimension(descriptor.dimension)),
            ..Default::default()
        });

        let sampler = self
            .device
            .create_sampler(&convert_sampler(descriptor.label.as_deref(), &descriptor.sampler));

        Ok(GpuTexture::Wgpu {
            texture,
            view,
            sampler,
        })
    }

    /// Write one tightly packed level.
    pub fn write_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        layer: u32,
        mip: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let wgpu_texture = wgpu_texture(texture)?;
        let (width, height) = descriptor.mip_level_size(mip);
        let block_size = descriptor.format.block_size();

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: wgpu_texture,
                mip_level: mip,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * block_size),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        Ok(())
    }

    /// Copy one level into a staging buffer and strip the row padding.
    pub fn read_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<u8>, GraphicsError> {
        let wgpu_texture = wgpu_texture(texture)?;
        let (width, height) = descriptor.mip_level_size(mip);
        let unpadded = width * descriptor.format.block_size();
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Texture Readback Buffer"),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Texture Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: wgpu_texture,
                mip_level: mip,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let idx = self.queue.submit(std::iter::once(encoder.finish()));
        self.wait_idle(idx)?;

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(GraphicsError::Internal(format!("readback map failed: {e}")));
            }
            Err(_) => return Err(GraphicsError::DeviceLost),
        }

        let mut data = Vec::with_capacity((unpadded * height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks(padded as usize).take(height as usize) {
                data.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        staging.unmap();

        Ok(data)
    }

    /// Build the render pipeline for a bake program.
    ///
    /// Binding 0 is the uniform block; programs with an input add the texture
    /// at binding 1 and its sampler at binding 2.
    pub fn create_program(
        &self,
        kind: ProgramKind,
        source: &str,
    ) -> Result<GpuProgram, GraphicsError> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kind.name()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        if let Some(dimension) = kind.input_dimension() {
            let view_dimension = match dimension {
                TextureDimension::D2 => wgpu::TextureViewDimension::D2,
                TextureDimension::Cube => wgpu::TextureViewDimension::Cube,
            };
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(kind.name()),
                    entries: &entries,
                });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Bake Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(kind.name()),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: convert_texture_format(kind.target_format()),
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
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
                multiview_mask: None,
                cache: None,
            });

        Ok(GpuProgram::Wgpu {
            pipeline,
            bind_group_layout,
        })
    }
}
