//! Shader programs and the semantic binding layer.
//!
//! - `shader` wraps a vertex/fragment source pair with its compiled
//!   program and cached variable locations
//! - `binding` defines the semantic binding keys and resolves them into
//!   concrete device calls each frame

pub mod binding;
pub mod shader;
