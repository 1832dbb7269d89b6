use peritele_core::{Pose, RigSlot};
use peritele_restrictor::{OffscreenView, SceneRenderer};

use crate::{GpuCompositor, GpuTarget};

/// Flat colour keyed on where a view stands, so current and predicted images differ.
pub fn clear_color(slot: RigSlot, pose: &Pose) -> wgpu::Color {
    let p = pose.pos;
    let band = |v: f32| f64::from(v.rem_euclid(4.0) / 4.0);
    let tint = match slot { RigSlot::Current => 0.25, RigSlot::Predicted => 0.75 };
    wgpu::Color { r: band(p.x), g: band(p.z), b: tint, a: 1.0 }
}

/// Stand-in scene: clears each off-screen target.
#[derive(Default)]
pub struct ClearRenderer { pub rendered: u64 }

impl SceneRenderer<GpuCompositor> for ClearRenderer {
    fn render(&mut self, backend: &mut GpuCompositor, view: &OffscreenView<'_, GpuTarget>) {
        let mut encoder = backend
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("aux-enc") });
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("aux-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view.target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(view.slot, &view.pose)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        backend.queue().submit(Some(encoder.finish()));
        self.rendered += 1;
    }
}
