//! Compute surface: evaluates a kernel once per grid cell
//!
//! The surface is a pluggable backend seam: the real implementation
//! ([`GpuSurface`]) drives a wgpu compute pipeline, while CPU-only test
//! builds substitute a software reference evaluator ([`CpuSurface`]) without
//! changing caller code.
//!
//! One invocation transiently owns its backend resources (pipeline, buffers,
//! staging), so the driver runs invocations one at a time; dispatch is
//! blocking and returns only after the full result buffer has been read back.
//! There is no cancellation and no timeout.

pub mod gpu;
pub mod reference;

pub use gpu::GpuSurface;
pub use reference::CpuSurface;

use crate::error::ComputeError;

/// Backend capability: compile a kernel fragment, then evaluate it over a
/// `width × height` grid.
///
/// Per-cell evaluation is embarrassingly parallel with no shared mutable
/// state; the output is row-major (`index = y*width + x`) with one f32 per
/// cell, sampled at cell centers `((x+0.5)/width, (y+0.5)/height)`.
pub trait ComputeSurface {
    /// Backend-specific compiled form of a kernel
    type Compiled;

    /// Compile a kernel fragment defining `fn rand(coordinate: vec2<f32>) -> f32`.
    ///
    /// # Errors
    ///
    /// [`ComputeError::Compile`] with a numbered-source log if the fragment
    /// is invalid; [`ComputeError::Link`] if the assembled pass fails.
    fn compile(&self, source: &str) -> Result<Self::Compiled, ComputeError>;

    /// Evaluate the compiled kernel over the grid and read back all
    /// `width*height` results synchronously.
    ///
    /// # Errors
    ///
    /// [`ComputeError::Dispatch`] on runtime dispatch/readback failure.
    fn dispatch(
        &self,
        compiled: &Self::Compiled,
        width: u32,
        height: u32,
    ) -> Result<Vec<f32>, ComputeError>;
}

/// Compile-and-dispatch convenience: one full kernel run.
///
/// # Errors
///
/// Rejects empty grids with [`ComputeError::Dispatch`]; otherwise propagates
/// the surface's compile/link/dispatch errors unchanged.
pub fn run_kernel<S: ComputeSurface>(
    surface: &S,
    source: &str,
    width: u32,
    height: u32,
) -> Result<Vec<f32>, ComputeError> {
    if width == 0 || height == 0 {
        return Err(ComputeError::Dispatch(format!(
            "grid must be non-empty, got {width}x{height}"
        )));
    }
    let compiled = surface.compile(source)?;
    let values = surface.dispatch(&compiled, width, height)?;
    debug_assert_eq!(values.len(), (width as usize) * (height as usize));
    Ok(values)
}

/// Prefix each source line with its 1-based line number, for compile logs.
#[must_use]
pub(crate) fn numbered_source(source: &str) -> String {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
