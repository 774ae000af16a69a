//! Batch sampling driver
//!
//! Runs every kernel in a registry against one grid, one invocation at a
//! time, and collects the results. A kernel that fails to compile, link, or
//! dispatch is reported and the rest of the batch proceeds — one broken
//! formula never aborts the run.

use rand::Rng;

use crate::error::ComputeError;
use crate::kernel::{Kernel, KernelSource, Registry};
use crate::sample::{Provenance, SampleRecord};
use crate::surface::{run_kernel, ComputeSurface};

/// Grid dimensions for one sampling run, uniform across kernels so their
/// metrics stay comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleGrid {
    /// Grid width
    pub width: u32,
    /// Grid height
    pub height: u32,
}

impl SampleGrid {
    /// Grid with explicit dimensions
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total cells (`width * height`)
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

impl Default for SampleGrid {
    /// 600×600 — the corpus-standard 360 000-sample grid
    fn default() -> Self {
        Self::new(600, 600)
    }
}

/// One kernel that produced no sample
#[derive(Debug)]
pub struct KernelFailure {
    /// The kernel that failed
    pub kernel: Kernel,
    /// Why no sample was produced
    pub error: ComputeError,
}

/// Result of sampling a registry: records for the kernels that ran, plus a
/// report for the ones that did not.
#[derive(Debug, Default)]
pub struct SampleBatch {
    /// Successful records, in registry order
    pub records: Vec<SampleRecord>,
    /// Failed kernels, in registry order
    pub failures: Vec<KernelFailure>,
}

/// Sample every kernel in the registry against the grid.
///
/// WGSL kernels run on the surface; [`KernelSource::HostBaseline`] kernels
/// draw `width*height` independent values from `rng` instead, giving the
/// non-GPU reference column every corpus carries. Invocations run strictly
/// one at a time (each transiently owns backend resources); a per-kernel
/// failure is recorded in [`SampleBatch::failures`] and the batch continues.
pub fn sample_registry<S, R>(
    surface: &S,
    registry: &Registry,
    grid: SampleGrid,
    provenance: &Provenance,
    rng: &mut R,
) -> SampleBatch
where
    S: ComputeSurface,
    R: Rng + ?Sized,
{
    let mut batch = SampleBatch::default();

    for kernel in registry.kernels() {
        let span = tracing::info_span!("sample_kernel", kernel = %kernel.name);
        let _guard = span.enter();

        let result = match &kernel.source {
            KernelSource::HostBaseline => {
                Ok((0..grid.cell_count()).map(|_| rng.gen::<f32>()).collect())
            }
            KernelSource::Wgsl(source) => run_kernel(surface, source, grid.width, grid.height),
        };

        match result {
            Ok(values) => {
                match SampleRecord::capture(
                    kernel.clone(),
                    grid.width,
                    grid.height,
                    values,
                    provenance.clone(),
                ) {
                    Ok(record) => {
                        tracing::info!(samples = record.sample_count(), "kernel sampled");
                        batch.records.push(record);
                    }
                    Err(e) => batch.failures.push(KernelFailure {
                        kernel: kernel.clone(),
                        error: ComputeError::Dispatch(format!(
                            "backend returned a malformed buffer: {e}"
                        )),
                    }),
                }
            }
            Err(error) => {
                tracing::warn!(%error, "kernel produced no sample");
                batch.failures.push(KernelFailure {
                    kernel: kernel.clone(),
                    error,
                });
            }
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::CpuSurface;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const KERNEL_A: &str = "fn rand(co: vec2<f32>) -> f32 { return co.x; }";
    const KERNEL_B: &str = "fn rand(co: vec2<f32>) -> f32 { retrun co.y; }"; // typo on purpose
    const KERNEL_C: &str = "fn rand(co: vec2<f32>) -> f32 { return co.y; }";

    fn registry() -> Registry {
        Registry::new(vec![
            Kernel::wgsl("a", KERNEL_A),
            Kernel::wgsl("b", KERNEL_B),
            Kernel::wgsl("c", KERNEL_C),
        ])
        .unwrap()
    }

    fn surface() -> CpuSurface {
        let mut surface = CpuSurface::new();
        surface.register(KERNEL_A, |co, _| co[0]);
        surface.register(KERNEL_C, |co, _| co[1]);
        surface
    }

    #[test]
    fn test_one_broken_kernel_does_not_abort_the_batch() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch = sample_registry(
            &surface(),
            &registry(),
            SampleGrid::new(8, 8),
            &Provenance::default(),
            &mut rng,
        );

        let names: Vec<&str> = batch.records.iter().map(|r| r.kernel.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].kernel.name, "b");
        assert!(matches!(
            batch.failures[0].error,
            ComputeError::Compile { .. }
        ));
    }

    #[test]
    fn test_host_baseline_bypasses_the_surface() {
        // Empty surface: any compile would fail, so success proves the
        // baseline never touched it.
        let registry = Registry::new(vec![Kernel::host_baseline("Javascript")]).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let batch = sample_registry(
            &CpuSurface::new(),
            &registry,
            SampleGrid::new(10, 10),
            &Provenance::default(),
            &mut rng,
        );

        assert!(batch.failures.is_empty());
        assert_eq!(batch.records.len(), 1);
        let record = &batch.records[0];
        assert_eq!(record.sample_count(), 100);
        assert!(record.values.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_batch_carries_provenance_verbatim() {
        let mut provenance = Provenance::default();
        provenance.navigator.platform = "test-platform".to_string();
        provenance.gl_info.renderer = "test-renderer".to_string();

        let registry = Registry::new(vec![Kernel::wgsl("a", KERNEL_A)]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let batch = sample_registry(
            &surface(),
            &registry,
            SampleGrid::new(4, 4),
            &provenance,
            &mut rng,
        );

        assert_eq!(batch.records[0].environment, provenance);
    }

    #[test]
    fn test_default_grid_is_corpus_standard() {
        let grid = SampleGrid::default();
        assert_eq!((grid.width, grid.height), (600, 600));
        assert_eq!(grid.cell_count(), 360_000);
    }
}
