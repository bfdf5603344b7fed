/// Error types that can occur during layer operations
///
/// # Variants
///
/// - `ShapeMismatch` - indicates that weight, input or state tensor dimensions are inconsistent with each other or with the layer configuration
/// - `Unsupported` - indicates that the requested operation is not meaningful for this layer variant and is never silently approximated
/// - `InputValidationError` - indicates the input data provided does not meet the expected format, type, or validation rules
/// - `ProcessingError` - indicates that there is something wrong while processing
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    ShapeMismatch(String),
    Unsupported(&'static str),
    InputValidationError(String),
    ProcessingError(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            ModelError::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
            ModelError::InputValidationError(msg) => write!(f, "Input validation error: {}", msg),
            ModelError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

/// Implements the standard error trait for ModelError
impl std::error::Error for ModelError {}
