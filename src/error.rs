//! Engine error types
//!
//! Only configuration and mounting can fail. The per-frame path never
//! returns an error; it degrades to drawing nothing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Host could not provide a drawing surface
    #[error("rendering surface unavailable")]
    SurfaceUnavailable,

    /// Surface exists but refused a 2D context
    #[error("2d rendering context unavailable")]
    ContextUnavailable,

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Browser API call failed (wasm host only)
    #[error("host: {0}")]
    Js(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
