//! Fullscreen-triangle draws for the wgpu backend.

use prism_core::profiling::profile_scope;

use crate::error::GraphicsError;

use super::super::{FullscreenDraw, GpuProgram, GpuTexture};
use super::WgpuBackend;
use super::resources::{level_view, wgpu_texture};

impl WgpuBackend {
    /// Record and submit one draw into `(face, mip)` of the target.
    pub fn draw_fullscreen_triangle(&self, draw: &FullscreenDraw<'_>) -> Result<(), GraphicsError> {
        profile_scope!("wgpu_draw");

        let GpuProgram::Wgpu {
            pipeline,
            bind_group_layout,
        } = draw.program.gpu_handle()
        else {
            return Err(GraphicsError::Internal(
                "wgpu backend received a non-wgpu program".to_string(),
            ));
        };

        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bake Uniforms"),
            size: std::mem::size_of_val(draw.uniforms) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(draw.uniforms));

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }];
        if draw.program.kind().input_dimension().is_some() {
            let Some(input) = draw.inputs.first() else {
                return Err(GraphicsError::InvalidParameter(format!(
                    "program {} needs an input texture",
                    draw.program.name()
                )));
            };
            let GpuTexture::Wgpu { view, sampler, .. } = input.gpu_handle() else {
                return Err(GraphicsError::Internal(
                    "wgpu backend received a non-wgpu texture".to_string(),
                ));
            };
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(draw.program.name()),
            layout: bind_group_layout,
            entries: &entries,
        });

        let target_view = level_view(wgpu_texture(draw.target.gpu_handle())?, draw.face, draw.mip);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Bake Draw Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(draw.program.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let vp = draw.viewport;
            render_pass.set_viewport(vp.x, vp.y, vp.width, vp.height, vp.min_depth, vp.max_depth);
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
