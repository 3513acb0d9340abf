//! Error categories from §7: build-time fatal/warning and runtime
//! recoverable/fatal. Deep integrator calls never propagate an `Err` (§7
//! propagation policy) — only build-time and driver-level operations return
//! [`RenderResult`]; runtime recoverable conditions are folded into
//! [`crate::render_context::Diagnostics`] instead.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("malformed density file {path}: {reason}")]
    MalformedDensityFile { path: String, reason: String },

    #[error("kd-tree build exceeded max stack depth ({depth})")]
    KdTreeStackOverflow { depth: usize },

    #[error("unsatisfiable render parameter: {0}")]
    InvalidParameter(String),

    #[error("worker thread pool creation failed: {0}")]
    ThreadPoolCreation(#[from] rayon::ThreadPoolBuildError),

    #[error("photon map I/O error: {0}")]
    PhotonMapIo(#[from] std::io::Error),

    #[error("photon map '{0}' has a corrupt or unrecognized header")]
    PhotonMapFormat(String),

    #[error("render aborted by cooperative cancellation")]
    Aborted,
}
