//! Error types for the CAM tools crate.
//!
//! Validation failures are raised before any move is produced, so a caller
//! either gets a complete [`MoveSequence`](crate::MoveSequence) or one of
//! these errors, never a partial result.

use std::io;
use thiserror::Error;

/// Errors that can occur during toolpath generation and export.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// A boundary was requested with a non-positive sampling tolerance.
    #[error("Invalid curve tolerance: {tolerance} (must be > 0)")]
    InvalidTolerance { tolerance: f64 },

    /// Toolpath or global settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] ParameterError),

    /// Shape geometry cannot produce a boundary.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// The requested postprocessor identifier is not registered.
    #[error("Unknown postprocessor: {0}")]
    UnknownPostprocessor(String),

    /// The static postprocessor table is inconsistent.
    #[error("Invalid postprocessor registry: {0}")]
    InvalidRegistry(String),

    /// The computation observed that a newer generation was requested.
    ///
    /// This is the expected outcome of a restart, not a failure.
    #[error("Computation superseded by a newer request")]
    Superseded,

    /// I/O error while writing machine code.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl CamToolError {
    /// Whether this error only signals that the work was superseded.
    pub fn is_superseded(&self) -> bool {
        matches!(self, CamToolError::Superseded)
    }
}

/// Errors related to settings validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Parameters are mutually incompatible.
    #[error("Incompatible parameters: {0}")]
    Incompatible(String),
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cam_tool_error_display() {
        let err = CamToolError::InvalidTolerance { tolerance: 0.0 };
        assert_eq!(err.to_string(), "Invalid curve tolerance: 0 (must be > 0)");

        let err = CamToolError::UnknownPostprocessor("heidenhain".to_string());
        assert_eq!(err.to_string(), "Unknown postprocessor: heidenhain");

        assert!(CamToolError::Superseded.is_superseded());
        assert!(!CamToolError::InvalidShape("empty".to_string()).is_superseded());
    }

    #[test]
    fn test_parameter_error_display() {
        let err = ParameterError::OutOfRange {
            name: "cutDepth".to_string(),
            value: -0.5,
            min: 0.0,
            max: f64::INFINITY,
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'cutDepth' out of range: -0.5 (valid: 0..inf)"
        );

        let err = ParameterError::Incompatible("finalPassDepth > cutDepth".to_string());
        assert_eq!(
            err.to_string(),
            "Incompatible parameters: finalPassDepth > cutDepth"
        );
    }

    #[test]
    fn test_error_conversion() {
        let param_err = ParameterError::Incompatible("finalPassDepth > cutDepth".to_string());
        let cam_err: CamToolError = param_err.into();
        assert!(matches!(cam_err, CamToolError::InvalidSettings(_)));

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let cam_err: CamToolError = io_err.into();
        assert!(matches!(cam_err, CamToolError::IoError(_)));
    }
}
