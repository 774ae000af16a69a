//! Error types for randgrid operations

use thiserror::Error;

/// Result type for randgrid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the compute surface.
///
/// All of these are deterministic input errors: retrying the same kernel
/// source against the same surface cannot succeed, so no retry logic exists
/// anywhere in the crate.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// No usable GPU adapter, or the device lacks a required capability
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// Kernel source failed to compile; the log carries the numbered source
    /// plus the driver diagnostic so the kernel author can fix it
    #[error("kernel compile failed:\n{log}")]
    Compile {
        /// Numbered kernel source followed by the compiler diagnostic
        log: String,
    },

    /// Kernel compiled but the full pass (kernel + harness) failed to link
    #[error("pipeline link failed:\n{log}")]
    Link {
        /// Linker diagnostic
        log: String,
    },

    /// Dispatch or readback failed at runtime
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// Errors from the sample codec and corpus loader.
#[derive(Debug, Error)]
pub enum CodecError {
    /// `base64values` is not valid base64
    #[error("invalid base64 in sample record: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Decoded byte length is not a multiple of 4 (one f32 per sample)
    #[error("encoded byte length {len} is not a multiple of 4")]
    ByteLengthNotAligned {
        /// Decoded byte length
        len: usize,
    },

    /// Sample count does not match the declared grid dimensions
    #[error("sample count mismatch: expected {expected} (width*height), got {actual}")]
    LengthMismatch {
        /// `width * height` from the record header
        expected: usize,
        /// Samples actually decoded
        actual: usize,
    },

    /// Record-level JSON failure during corpus load
    #[error("malformed corpus record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from registry construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No kernels configured
    #[error("kernel registry is empty")]
    EmptyRegistry,
}

/// Top-level error for randgrid operations
#[derive(Debug, Error)]
pub enum Error {
    /// Compute surface failure
    #[error(transparent)]
    Compute(#[from] ComputeError),

    /// Codec or corpus-record failure
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Registry failure
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Corpus file is not a JSON array of records
    #[error("corpus is not a JSON array: {0}")]
    CorpusShape(#[source] serde_json::Error),
}
