//! GPU compute surface using wgpu (Vulkan/Metal/DX12/WebGPU)
//!
//! Splices the kernel fragment into a fixed WGSL harness, runs one compute
//! pass over the grid, and reads the single-channel f32 result buffer back
//! synchronously. All transient resources (pipeline, buffers, staging) are
//! scoped to one call and released on every exit path by drop order.

use super::{numbered_source, ComputeSurface};
use crate::error::ComputeError;
use crate::sample::GlInfo;

/// Harness preamble: output buffer, grid params, and the `out_size` value a
/// kernel may consult for an exact non-random index.
const HARNESS_PREFIX: &str = "\
struct Params {
    width: u32,
    height: u32,
}

@group(0) @binding(0) var<storage, read_write> out_values: array<f32>;
@group(0) @binding(1) var<uniform> params: Params;

var<private> out_size: vec2<f32>;

";

/// Harness entry point: cell-center coordinate in [0,1)², row-major output.
const HARNESS_MAIN: &str = "
@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    if (gid.x >= params.width || gid.y >= params.height) {
        return;
    }
    out_size = vec2<f32>(f32(params.width), f32(params.height));
    let coordinate = vec2<f32>(
        (f32(gid.x) + 0.5) / f32(params.width),
        (f32(gid.y) + 0.5) / f32(params.height),
    );
    out_values[gid.y * params.width + gid.x] = rand(coordinate);
}
";

/// Full shader source for one kernel fragment.
#[must_use]
fn assemble_shader(fragment: &str) -> String {
    let mut source = String::with_capacity(HARNESS_PREFIX.len() + fragment.len() + HARNESS_MAIN.len());
    source.push_str(HARNESS_PREFIX);
    source.push_str(fragment);
    source.push_str(HARNESS_MAIN);
    source
}

/// Grid dimensions uniform, padded to 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    width: u32,
    height: u32,
    _padding: [u32; 2],
}

/// A kernel compiled against one device.
pub struct GpuKernel {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// GPU compute surface.
///
/// Owns the device and queue; each [`dispatch`](ComputeSurface::dispatch)
/// allocates its own buffers so no resource outlives the call.
pub struct GpuSurface {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_info: wgpu::AdapterInfo,
}

impl GpuSurface {
    /// Initialize the GPU surface.
    ///
    /// # Errors
    ///
    /// [`ComputeError::UnsupportedBackend`] if no adapter is found or device
    /// creation fails.
    pub fn new() -> Result<Self, ComputeError> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self, ComputeError> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| ComputeError::UnsupportedBackend("no GPU adapter found".to_string()))?;

        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("randgrid sampling device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| {
                ComputeError::UnsupportedBackend(format!("failed to create device: {e}"))
            })?;

        tracing::debug!(adapter = %adapter_info.name, backend = ?adapter_info.backend, "GPU surface ready");

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }

    /// Check if a GPU adapter is available without creating a device
    pub fn is_available() -> bool {
        pollster::block_on(async {
            wgpu::Instance::default()
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Adapter vendor/renderer strings for sample provenance
    #[must_use]
    pub fn gl_info(&self) -> GlInfo {
        let vendor = if self.adapter_info.driver.is_empty() {
            format!("{:?}", self.adapter_info.backend)
        } else {
            self.adapter_info.driver.clone()
        };
        GlInfo {
            vendor,
            renderer: self.adapter_info.name.clone(),
        }
    }
}

impl ComputeSurface for GpuSurface {
    type Compiled = GpuKernel;

    fn compile(&self, source: &str) -> Result<GpuKernel, ComputeError> {
        let full_source = assemble_shader(source);

        // Shader validation errors are captured via an error scope rather
        // than the global uncaptured-error handler.
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Kernel Shader"),
                source: wgpu::ShaderSource::Wgsl(full_source.as_str().into()),
            });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::Compile {
                log: format!("{}\n\n{error}", numbered_source(&full_source)),
            });
        }

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Kernel Bind Group Layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: false },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Kernel Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        // Assembling the full pass (kernel + harness) is the link step: a
        // fragment that compiles in isolation can still fail here, e.g. a
        // rand() signature that doesn't match the harness call.
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Kernel Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: "main",
                compilation_options: Default::default(),
                cache: None,
            });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::Link {
                log: format!("{}\n\n{error}", numbered_source(&full_source)),
            });
        }

        Ok(GpuKernel {
            pipeline,
            bind_group_layout,
        })
    }

    fn dispatch(
        &self,
        compiled: &GpuKernel,
        width: u32,
        height: u32,
    ) -> Result<Vec<f32>, ComputeError> {
        pollster::block_on(self.dispatch_async(compiled, width, height))
    }
}

impl GpuSurface {
    async fn dispatch_async(
        &self,
        compiled: &GpuKernel,
        width: u32,
        height: u32,
    ) -> Result<Vec<f32>, ComputeError> {
        let cell_count = (width as usize) * (height as usize);
        let buffer_size = (cell_count * std::mem::size_of::<f32>()) as u64;

        let out_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sample Output"),
            size: buffer_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let params = Params {
            width,
            height,
            _padding: [0; 2],
        };
        let params_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Grid Params"),
            size: std::mem::size_of::<Params>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue
            .write_buffer(&params_buffer, 0, bytemuck::bytes_of(&params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Kernel Bind Group"),
            layout: &compiled.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: out_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Kernel Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Kernel Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&compiled.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);

            // One thread per cell, 16×16 threads per workgroup
            let workgroups_x = width.div_ceil(16);
            let workgroups_y = height.div_ceil(16);
            compute_pass.dispatch_workgroups(workgroups_x, workgroups_y, 1);
        }

        encoder.copy_buffer_to_buffer(&out_buffer, 0, &staging_buffer, 0, buffer_size);

        self.queue.submit(Some(encoder.finish()));

        // Blocking readback: the call does not return until the full result
        // buffer is available.
        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });

        self.device.poll(wgpu::Maintain::Wait);

        receiver
            .receive()
            .await
            .ok_or_else(|| ComputeError::Dispatch("readback channel closed".to_string()))?
            .map_err(|e| ComputeError::Dispatch(format!("buffer mapping failed: {e:?}")))?;

        let values = {
            let data = buffer_slice.get_mapped_range();
            bytemuck::cast_slice::<u8, f32>(&data).to_vec()
        };

        staging_buffer.unmap();

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{CLASSIC_RANDOM_WGSL, PERFECT_DISTRIBUTION_WGSL};
    use crate::surface::run_kernel;

    #[test]
    fn test_assemble_shader_splices_fragment() {
        let full = assemble_shader(CLASSIC_RANDOM_WGSL);
        assert!(full.starts_with("struct Params"));
        assert!(full.contains("fn rand(co: vec2<f32>)"));
        assert!(full.contains("@compute @workgroup_size(16, 16)"));
    }

    #[test]
    fn test_gpu_classic_kernel_shape_and_range() {
        if !GpuSurface::is_available() {
            eprintln!("GPU not available, skipping test");
            return;
        }

        let surface = GpuSurface::new().expect("surface init");
        let values = run_kernel(&surface, CLASSIC_RANDOM_WGSL, 64, 48).expect("run");
        assert_eq!(values.len(), 64 * 48);
        for &v in &values {
            assert!(v.is_finite());
            assert!((0.0..=1.0).contains(&v), "sample out of range: {v}");
        }
    }

    #[test]
    fn test_gpu_perfect_distribution_matches_index_ramp() {
        if !GpuSurface::is_available() {
            eprintln!("GPU not available, skipping test");
            return;
        }

        let surface = GpuSurface::new().expect("surface init");
        let (w, h) = (32u32, 16u32);
        let values = run_kernel(&surface, PERFECT_DISTRIBUTION_WGSL, w, h).expect("run");
        let n = (w * h) as f32;
        for (i, &v) in values.iter().enumerate() {
            let expected = i as f32 / n;
            assert!(
                (v - expected).abs() < 1e-6,
                "cell {i}: got {v}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_gpu_compile_error_carries_numbered_source() {
        if !GpuSurface::is_available() {
            eprintln!("GPU not available, skipping test");
            return;
        }

        let surface = GpuSurface::new().expect("surface init");
        let err = surface
            .compile("fn rand(co: vec2<f32>) -> f32 { return not_a_symbol; }")
            .err()
            .expect("broken kernel must not compile");
        match err {
            ComputeError::Compile { log } | ComputeError::Link { log } => {
                assert!(log.contains("1: struct Params"), "log lacks numbering:\n{log}");
            }
            other => panic!("expected compile/link error, got {other:?}"),
        }
    }
}
