//! Error taxonomy for the render core.
//!
//! Every failure a frame can produce falls into one of four buckets, and
//! none of them is allowed to unwind past the draw pass it occurred in.
//! The [`Renderer`](crate::render::Renderer) catches pass-level errors,
//! logs them and carries on with the remaining passes and objects.

use thiserror::Error;

/// The closed set of failures the render core produces.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Shader source failed to compile or link. Fatal for that shader:
    /// every pass using it draws nothing until a new shader is supplied.
    #[error("shader `{label}` failed to compile: {message}")]
    Compile { label: String, message: String },

    /// A declared uniform/attribute is absent from the compiled program,
    /// a semantic key cannot be resolved against the current draw context,
    /// or required material state is missing. Recoverable by skipping the
    /// affected pass.
    #[error("binding `{name}` failed: {reason}")]
    Binding { name: String, reason: String },

    /// A resource (typically a texture mid-load) is not usable yet. Heals
    /// itself once loading completes on a later frame.
    #[error("resource `{0}` is not ready")]
    ResourceNotReady(String),

    /// Invalid geometry input caught at declare time (index out of range,
    /// wrong attribute arity). Triangulation itself never raises this; a
    /// degenerate polygon degrades to a logged best-effort result instead.
    #[error("geometry error: {0}")]
    Geometry(String),
}

impl RenderError {
    pub(crate) fn binding(name: &str, reason: impl Into<String>) -> Self {
        Self::Binding {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        Self::Geometry(reason.into())
    }
}
