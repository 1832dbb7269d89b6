use peritele_restrictor::{DispatchGrid, KernelBindings, KernelParams, RenderBackend, TargetDesc};
use tracing::{debug, info, warn};

use crate::{GpuError, PERIPHERAL_WGSL};

/// Off-screen texture owned by the compositor.
pub struct GpuTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub desc: TargetDesc,
    scratch: bool,
}

#[inline]
pub fn texture_format(desc: &TargetDesc) -> wgpu::TextureFormat {
    if desc.srgb { wgpu::TextureFormat::Rgba8UnormSrgb } else { wgpu::TextureFormat::Rgba8Unorm }
}

/// Every target can be sampled, copied and rendered to; storage only when asked
/// (sRGB formats cannot be storage-bound).
pub fn texture_usage(desc: &TargetDesc) -> wgpu::TextureUsages {
    let mut u = wgpu::TextureUsages::TEXTURE_BINDING
        | wgpu::TextureUsages::COPY_SRC
        | wgpu::TextureUsages::COPY_DST
        | wgpu::TextureUsages::RENDER_ATTACHMENT;
    if desc.storage && !desc.srgb { u |= wgpu::TextureUsages::STORAGE_BINDING; }
    u
}

pub struct GpuCompositor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_layout: wgpu::BindGroupLayout,
    params_buf: wgpu::Buffer,
    /// Bound when the technique leaves a peripheral input empty.
    fallback: GpuTarget,
    eye: TargetDesc,
    pool: Vec<GpuTarget>,
    adapter_info: wgpu::AdapterInfo,
    warned_fallback: bool,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

impl GpuCompositor {
    /// Headless device with eye targets of `width` x `height`.
    pub fn new(width: u32, height: u32) -> Result<Self, GpuError> {
        if width == 0 || height == 0 {
            return Err(GpuError::ZeroExtent { width, height });
        }
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(GpuError::NoAdapter)?;
        let adapter_info = adapter.get_info();

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("peritele-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            },
            None,
        ))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("peripheral.wgsl"),
            source: wgpu::ShaderSource::Wgsl(PERIPHERAL_WGSL.into()),
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("peripheral-layout"),
            entries: &[
                // 0: kernel params
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 1..3: moving cam, current rig, predicted rig
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                // 4: result
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("peripheral-pl"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("peripheral-pipe"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        let params_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("peripheral-params"),
            size: std::mem::size_of::<KernelParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let fallback = make_target(&device, &TargetDesc::new(1, 1).linear(), "fallback", false);

        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            width, height,
            "gpu compositor ready"
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_layout,
            params_buf,
            fallback,
            eye: TargetDesc::new(width, height),
            pool: Vec::new(),
            adapter_info,
            warned_fallback: false,
        })
    }

    #[inline] pub fn device(&self) -> &wgpu::Device { &self.device }
    #[inline] pub fn queue(&self) -> &wgpu::Queue { &self.queue }
    #[inline] pub fn adapter_info(&self) -> &wgpu::AdapterInfo { &self.adapter_info }

    /// Block until submitted work has finished.
    pub fn wait_idle(&self) { self.device.poll(wgpu::Maintain::Wait); }
}

fn make_target(device: &wgpu::Device, desc: &TargetDesc, label: &str, scratch: bool) -> GpuTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width: desc.width.max(1), height: desc.height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: texture_format(desc),
        usage: texture_usage(desc),
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTarget { texture, view, desc: *desc, scratch }
}

impl RenderBackend for GpuCompositor {
    type Target = GpuTarget;

    fn eye_target_desc(&self) -> TargetDesc { self.eye }

    fn create_target(&mut self, desc: &TargetDesc, label: &str) -> GpuTarget {
        make_target(&self.device, desc, label, false)
    }

    fn acquire_scratch(&mut self, desc: &TargetDesc) -> GpuTarget {
        match self.pool.iter().position(|t| t.desc == *desc) {
            Some(i) => self.pool.swap_remove(i),
            None => {
                debug!(width = desc.width, height = desc.height, "scratch target allocated");
                make_target(&self.device, desc, "scratch", true)
            }
        }
    }

    fn release(&mut self, target: GpuTarget) {
        if target.scratch {
            self.pool.push(target);
        } else {
            target.texture.destroy();
        }
    }

    fn dispatch(&mut self, params: &KernelParams, b: &KernelBindings<'_, GpuTarget>, grid: DispatchGrid) {
        if grid.is_empty() { return; }
        self.queue.write_buffer(&self.params_buf, 0, bytemuck::bytes_of(params));

        if b.is_partial() && !self.warned_fallback {
            self.warned_fallback = true;
            warn!(
                current = b.current.is_some(),
                predicted = b.predicted.is_some(),
                "peripheral input unbound; sampling the blank fallback"
            );
        }
        let current = b.current.unwrap_or(&self.fallback);
        let predicted = b.predicted.unwrap_or(&self.fallback);
        let bind = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("peripheral-bind"),
            layout: &self.bind_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: self.params_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&b.moving_cam.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&current.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&predicted.view) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(&b.result.view) },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("peripheral-enc") });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("peripheral-cp"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.pipeline);
            cpass.set_bind_group(0, &bind, &[]);
            cpass.dispatch_workgroups(grid.x, grid.y, grid.z);
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn blit(&mut self, src: &GpuTarget, dst: &GpuTarget) {
        let size = wgpu::Extent3d {
            width: src.desc.width.min(dst.desc.width).max(1),
            height: src.desc.height.min(dst.desc.height).max(1),
            depth_or_array_layers: 1,
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("blit-enc") });
        encoder.copy_texture_to_texture(src.texture.as_image_copy(), dst.texture.as_image_copy(), size);
        self.queue.submit(Some(encoder.finish()));
    }
}
