//! Randgrid: GPU sampling harness and statistical validator for
//! shader-style PRNG kernels
//!
//! Shader code has no `random()`: per-pixel noise comes from ad-hoc hashing
//! formulas of uncertain quality. Randgrid compares competing formulas by
//! running each one over a `width × height` coordinate grid on a wgpu
//! compute backend, persisting the resulting sample buffers as a shareable
//! corpus, and characterizing their quality statistically (tail calibration,
//! nearest-neighbor spacing).
//!
//! # Pipeline
//!
//! 1. [`kernel::Registry`] — the catalog of named `rand()` formulas, plus a
//!    host-RNG baseline that bypasses the GPU
//! 2. [`surface`] — evaluates a kernel once per grid cell and reads back the
//!    raw f32 buffer; [`surface::GpuSurface`] for real runs,
//!    [`surface::CpuSurface`] as a software reference for tests
//! 3. [`sampler`] — drives a whole registry, isolating per-kernel failures
//! 4. [`codec`] / [`corpus`] — lossless base64+JSON persistence of sample
//!    records with their provenance
//! 5. [`stats`] — tail-ratio metrics and spacing histograms over any buffer
//!
//! # Quick start
//!
//! ```no_run
//! use rand::SeedableRng;
//! use randgrid::kernel::Registry;
//! use randgrid::sample::{HostProvenance, ProvenanceCollector};
//! use randgrid::sampler::{sample_registry, SampleGrid};
//! use randgrid::surface::GpuSurface;
//!
//! let surface = GpuSurface::new()?;
//! let provenance = HostProvenance::with_gl_info(surface.gl_info()).collect();
//! let mut rng = rand::rngs::StdRng::from_entropy();
//!
//! let batch = sample_registry(
//!     &surface,
//!     &Registry::reference_set(),
//!     SampleGrid::default(),
//!     &provenance,
//!     &mut rng,
//! );
//!
//! for record in &batch.records {
//!     for row in randgrid::stats::tail_comparisons(&record.values) {
//!         println!("{}: ratio {:.3} ({})", record.kernel.name, row.ratio, row.count);
//!     }
//! }
//! # Ok::<(), randgrid::Error>(())
//! ```

pub mod codec;
pub mod corpus;
pub mod error;
pub mod kernel;
pub mod sample;
pub mod sampler;
pub mod stats;
pub mod surface;

pub use codec::EncodedSampleRecord;
pub use corpus::Corpus;
pub use error::{CodecError, ComputeError, Error, RegistryError, Result};
pub use kernel::{Kernel, KernelSource, Registry};
pub use sample::{Provenance, SampleRecord};
pub use sampler::{sample_registry, SampleBatch, SampleGrid};
pub use surface::{ComputeSurface, CpuSurface, GpuSurface};
