//! Kernel catalog: named `rand()` formulas under test
//!
//! A kernel is a WGSL fragment defining `fn rand(coordinate: vec2<f32>) -> f32`
//! (plus any private helpers), evaluated once per grid cell by the compute
//! surface. One distinguished kernel bypasses the surface entirely and is
//! sampled from the host's general-purpose uniform generator; it is modeled as
//! a tagged variant rather than a sentinel name so callers never string-match.

use crate::error::RegistryError;

/// Wire sentinel for the host-baseline kernel.
///
/// Persisted corpora store the baseline's `implementation` field as this
/// string; the codec maps it back to [`KernelSource::HostBaseline`] on load.
pub const HOST_BASELINE_WIRE: &str = "Javascript";

/// The formula a kernel evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelSource {
    /// Draw `width*height` independent values from the host uniform RNG
    /// instead of running on the compute surface
    HostBaseline,
    /// WGSL fragment defining `fn rand(coordinate: vec2<f32>) -> f32`.
    /// May read the injected `out_size: vec2<f32>` uniform carrying
    /// `(width, height)` as floats.
    Wgsl(String),
}

impl KernelSource {
    /// The `implementation` string persisted in corpus records.
    #[must_use]
    pub fn wire_source(&self) -> &str {
        match self {
            Self::HostBaseline => HOST_BASELINE_WIRE,
            Self::Wgsl(source) => source,
        }
    }

    /// Inverse of [`wire_source`](Self::wire_source) for corpus load.
    #[must_use]
    pub fn from_wire(source: &str) -> Self {
        if source == HOST_BASELINE_WIRE {
            Self::HostBaseline
        } else {
            Self::Wgsl(source.to_string())
        }
    }
}

/// A named formula under test. Immutable once defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    /// Display name (e.g. "Classic random")
    pub name: String,
    /// The formula
    pub source: KernelSource,
}

impl Kernel {
    /// Convenience constructor for a WGSL kernel
    pub fn wgsl(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: KernelSource::Wgsl(source.into()),
        }
    }

    /// The host-baseline kernel
    pub fn host_baseline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: KernelSource::HostBaseline,
        }
    }
}

/// Immutable, explicitly constructed catalog of kernels.
///
/// No validation happens here beyond non-emptiness: a kernel with broken
/// source only fails when it actually runs on the surface.
#[derive(Debug, Clone)]
pub struct Registry {
    kernels: Vec<Kernel>,
}

impl Registry {
    /// Build a registry from an explicit kernel list.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyRegistry`] if the list is empty.
    pub fn new(kernels: Vec<Kernel>) -> Result<Self, RegistryError> {
        if kernels.is_empty() {
            return Err(RegistryError::EmptyRegistry);
        }
        Ok(Self { kernels })
    }

    /// Kernels in registration order
    #[must_use]
    pub fn kernels(&self) -> &[Kernel] {
        &self.kernels
    }

    /// Number of kernels
    #[must_use]
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Always false: construction rejects empty lists
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// The reference catalog of competing `rand()` formulas.
    ///
    /// - host baseline: `width*height` draws from the host uniform RNG
    /// - "Classic random": the ubiquitous fract/sin/dot hash
    /// - "Blixt random": seeded variant with a mod-2π guard on the sin argument
    /// - "Dummy perfect distribution": deterministic `index / (w*h)` ramp,
    ///   the calibration baseline whose tail ratios are exactly 1.0
    #[must_use]
    pub fn reference_set() -> Self {
        Self {
            kernels: vec![
                Kernel::host_baseline("Javascript"),
                Kernel::wgsl("Classic random", CLASSIC_RANDOM_WGSL),
                Kernel::wgsl("Blixt random", BLIXT_RANDOM_WGSL),
                Kernel::wgsl("Dummy perfect distribution", PERFECT_DISTRIBUTION_WGSL),
            ],
        }
    }
}

/// The classic one-liner trigonometric hash.
pub const CLASSIC_RANDOM_WGSL: &str = "\
fn rand(co: vec2<f32>) -> f32 {
    return fract(sin(dot(co, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}
";

/// Seeded variant that wraps the sin argument into [0, 2π) first, avoiding
/// the precision collapse of sin() on large arguments.
pub const BLIXT_RANDOM_WGSL: &str = "\
fn rands(value: vec2<f32>, seed: f32) -> f32 {
    let dot_value = dot(value, vec2<f32>(1096.6331584285, 3020.29322778)) * (1.0 + seed);
    return fract(sin(dot_value % 6.283185307179586) * 59874.14171519782);
}

fn rand(value: vec2<f32>) -> f32 {
    return rands(value, 0.0);
}
";

/// Not random at all: emits `index / (width*height)` so every tail ratio is
/// exactly 1.0. Exists to calibrate the analyzer, not to compete.
pub const PERFECT_DISTRIBUTION_WGSL: &str = "\
fn rand(co: vec2<f32>) -> f32 {
    let pos = vec2<u32>(co * out_size);
    let index = pos.y * u32(out_size.x) + pos.x;
    return f32(index) / (out_size.x * out_size.y);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_rejected() {
        assert_eq!(
            Registry::new(vec![]).unwrap_err(),
            RegistryError::EmptyRegistry
        );
    }

    #[test]
    fn test_registry_preserves_order() {
        let registry = Registry::new(vec![
            Kernel::wgsl("a", "fn rand(co: vec2<f32>) -> f32 { return 0.0; }"),
            Kernel::wgsl("b", "fn rand(co: vec2<f32>) -> f32 { return 1.0; }"),
        ])
        .unwrap();
        let names: Vec<&str> = registry.kernels().iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_reference_set_leads_with_host_baseline() {
        let registry = Registry::reference_set();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.kernels()[0].source, KernelSource::HostBaseline);
    }

    #[test]
    fn test_wire_sentinel_roundtrip() {
        assert_eq!(
            KernelSource::from_wire(HOST_BASELINE_WIRE),
            KernelSource::HostBaseline
        );
        assert_eq!(KernelSource::HostBaseline.wire_source(), HOST_BASELINE_WIRE);

        let wgsl = KernelSource::from_wire(CLASSIC_RANDOM_WGSL);
        assert_eq!(wgsl.wire_source(), CLASSIC_RANDOM_WGSL);
        assert!(matches!(wgsl, KernelSource::Wgsl(_)));
    }

    #[test]
    fn test_wgsl_kernels_define_rand_entry_point() {
        for kernel in Registry::reference_set().kernels() {
            if let KernelSource::Wgsl(source) = &kernel.source {
                assert!(
                    source.contains("fn rand("),
                    "kernel {} lacks a rand() entry point",
                    kernel.name
                );
            }
        }
    }
}
