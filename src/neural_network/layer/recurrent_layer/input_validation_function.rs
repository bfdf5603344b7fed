use super::*;
use crate::ModelError;
use crate::neural_network::Tensor;
use ndarray::Array3;

/// Validates that a dimension value is greater than 0
///
/// # Parameters
///
/// - `value` - The dimension value to validate
/// - `name` - The name of the dimension for error messages
///
/// # Returns
///
/// * `Ok(())` if validation passes
/// * `Err(ModelError)` if validation fails
pub(super) fn validate_dimension_greater_than_zero(
    value: usize,
    name: &str,
) -> Result<(), ModelError> {
    if value == 0 {
        return Err(ModelError::InputValidationError(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

/// Validates input dimensions for recurrent layers
///
/// # Parameters
///
/// - `input_dim` - The input dimension to validate
/// - `units` - The units dimension to validate
///
/// # Returns
///
/// * `Ok(())` if validation passes
/// * `Err(ModelError)` if validation fails
pub(super) fn validate_recurrent_dimensions(
    input_dim: usize,
    units: usize,
) -> Result<(), ModelError> {
    validate_dimension_greater_than_zero(input_dim, "input_dim")?;
    validate_dimension_greater_than_zero(units, "units")?;
    Ok(())
}

/// Validates that a sequence tensor is 3D with the expected feature axis,
/// and converts it to a concrete 3-dimensional array.
///
/// The expected layout is \[batch, feature, time\].
///
/// # Parameters
///
/// - `input` - The sequence tensor to validate
/// - `feature_dim` - The expected size of the feature axis
/// - `name` - The name of the tensor for error messages
///
/// # Returns
///
/// * `Ok(Array3<f32>)` if validation passes
/// * `Err(ModelError)` if the tensor is not 3D or the feature axis does not match
pub(super) fn validate_sequence_tensor(
    input: &Tensor,
    feature_dim: usize,
    name: &str,
) -> Result<Array3<f32>, ModelError> {
    if input.ndim() != 3 {
        return Err(ModelError::InputValidationError(format!(
            "{} tensor is not 3D",
            name
        )));
    }
    let x3 = input
        .view()
        .into_dimensionality::<ndarray::Ix3>()
        .unwrap()
        .to_owned();
    if x3.shape()[1] != feature_dim {
        return Err(ModelError::ShapeMismatch(format!(
            "{} has {} features on axis 1, layer expects {}",
            name,
            x3.shape()[1],
            feature_dim
        )));
    }
    Ok(x3)
}
