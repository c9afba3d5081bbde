//! Error types for pipeline assembly
//!
//! The shading math never fails; malformed inputs degrade the image instead.
//! Errors only surface where the host configures shaders, bindings or the
//! render graph.

use thiserror::Error;

/// Errors raised while configuring or assembling the shading pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShadingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Shader composition failed: {0}")]
    ShaderComposition(String),
    #[error("Shader '{label}' failed validation: {message}")]
    ShaderValidation { label: String, message: String },
    #[error("Render graph contains a dependency cycle between passes: {0:?}")]
    GraphCycle(Vec<String>),
    #[error("Pass '{pass}' reads '{resource}' but no pass writes it")]
    MissingProducer { pass: String, resource: String },
    #[error("Unknown render graph resource: {0}")]
    UnknownResource(String),
}

pub type ShadingResult<T> = Result<T, ShadingError>;
