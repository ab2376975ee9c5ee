use super::context::GpuContext;
use super::mesh::{LineBatch, LineVertex};
use super::pipeline::LinePipeline;
use crate::scene::Color;

const INITIAL_VERTEX_CAPACITY: u64 = 4096;

/// Draws a [`LineBatch`] into a colour target with depth.
pub struct DebugRenderer {
    pipeline: LinePipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
    srgb_target: bool,
}

impl DebugRenderer {
    pub fn new(context: &GpuContext) -> Self {
        let pipeline = LinePipeline::new(context);
        let vertex_buffer = Self::create_vertex_buffer(&context.device, INITIAL_VERTEX_CAPACITY);

        Self {
            pipeline,
            vertex_buffer,
            vertex_capacity: INITIAL_VERTEX_CAPACITY,
            srgb_target: context.config.format.is_srgb(),
        }
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Vertex Buffer"),
            size: capacity * std::mem::size_of::<LineVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Scene colours are authored in sRGB; an sRGB target expects linear.
    fn clear_color(&self, color: Color) -> wgpu::Color {
        let channel = |c: f32| {
            let c = f64::from(c);
            if self.srgb_target {
                c.powf(2.2)
            } else {
                c
            }
        };
        let [r, g, b] = color.to_array();
        wgpu::Color {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            a: 1.0,
        }
    }

    /// Records one pass that clears `target` and draws `batch`.
    pub fn draw(
        &mut self,
        context: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        batch: &LineBatch,
    ) {
        let vertex_count = batch.vertices.len() as u64;
        if vertex_count > self.vertex_capacity {
            self.vertex_capacity = vertex_count.next_power_of_two();
            self.vertex_buffer = Self::create_vertex_buffer(&context.device, self.vertex_capacity);
            log::debug!("line buffer grown to {} vertices", self.vertex_capacity);
        }

        self.pipeline.write_view_proj(&context.queue, batch.view_proj);
        if vertex_count > 0 {
            context
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&batch.vertices));
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Line Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color(batch.clear_color)),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &context.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if vertex_count > 0 {
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.pipeline.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..vertex_count * std::mem::size_of::<LineVertex>() as u64));
            render_pass.draw(0..vertex_count as u32, 0..1);
        }
    }

    /// Acquires the next surface frame, draws `batch` and presents it.
    pub fn render(&mut self, context: &mut GpuContext, batch: &LineBatch) {
        let Some(output) = acquire_frame(context) else {
            return;
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        self.draw(context, &mut encoder, &view, batch);
        context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Next surface texture, reconfiguring when the surface went stale. `None`
/// skips this frame.
pub fn acquire_frame(context: &mut GpuContext) -> Option<wgpu::SurfaceTexture> {
    match context.surface.get_current_texture() {
        Ok(output) => Some(output),
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            context.reconfigure();
            None
        }
        Err(wgpu::SurfaceError::Timeout) => None,
        Err(e) => {
            log::error!("Surface error: {:?}", e);
            None
        }
    }
}
