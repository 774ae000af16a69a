//! Software reference surface for CPU-only builds and tests
//!
//! Evaluates registered kernels in plain Rust over the same cell-center grid
//! as the GPU surface. "Compilation" is a lookup from source text to a
//! registered evaluator closure, so unknown source fails with the same
//! [`ComputeError::Compile`] shape callers see from a real driver.

use std::collections::HashMap;
use std::sync::Arc;

use super::{numbered_source, ComputeSurface};
use crate::error::ComputeError;
use crate::kernel::{BLIXT_RANDOM_WGSL, CLASSIC_RANDOM_WGSL, PERFECT_DISTRIBUTION_WGSL};

/// A software kernel: `rand(coordinate, out_size) -> sample`
pub type Evaluator = dyn Fn([f32; 2], [f32; 2]) -> f32 + Send + Sync;

/// CPU reference surface backed by a table of evaluator closures.
#[derive(Default)]
pub struct CpuSurface {
    evaluators: HashMap<String, Arc<Evaluator>>,
}

impl CpuSurface {
    /// Empty surface: every compile fails until evaluators are registered
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a software evaluator for a kernel source string
    pub fn register(
        &mut self,
        source: impl Into<String>,
        evaluator: impl Fn([f32; 2], [f32; 2]) -> f32 + Send + Sync + 'static,
    ) {
        self.evaluators.insert(source.into(), Arc::new(evaluator));
    }

    /// Surface preloaded with software renditions of the reference kernels
    #[must_use]
    pub fn reference() -> Self {
        let mut surface = Self::new();
        surface.register(CLASSIC_RANDOM_WGSL, |co, _| {
            fract((co[0] * 12.9898 + co[1] * 78.233).sin() * 43758.5453)
        });
        surface.register(BLIXT_RANDOM_WGSL, |value, _| {
            let dot_value = value[0] * 1096.633_2 + value[1] * 3020.293_2;
            fract((dot_value % 6.283_185_5).sin() * 59874.14)
        });
        surface.register(PERFECT_DISTRIBUTION_WGSL, |co, out_size| {
            let x = (co[0] * out_size[0]) as u32;
            let y = (co[1] * out_size[1]) as u32;
            let index = y * (out_size[0] as u32) + x;
            index as f32 / (out_size[0] * out_size[1])
        });
        surface
    }
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

impl ComputeSurface for CpuSurface {
    type Compiled = Arc<Evaluator>;

    fn compile(&self, source: &str) -> Result<Arc<Evaluator>, ComputeError> {
        self.evaluators
            .get(source)
            .cloned()
            .ok_or_else(|| ComputeError::Compile {
                log: format!(
                    "{}\n\nno software evaluator registered for this source",
                    numbered_source(source)
                ),
            })
    }

    fn dispatch(
        &self,
        compiled: &Arc<Evaluator>,
        width: u32,
        height: u32,
    ) -> Result<Vec<f32>, ComputeError> {
        let out_size = [width as f32, height as f32];
        let mut values = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                let coordinate = [
                    (x as f32 + 0.5) / width as f32,
                    (y as f32 + 0.5) / height as f32,
                ];
                values.push(compiled(coordinate, out_size));
            }
        }
        Ok(values)
    }
}
