use super::*;
use ndarray::Array2;

/// Threshold for using parallel computation in recurrent layers.
/// When batch_size * units < this value, sequential execution is used.
/// When batch_size * units >= this value, parallel execution is used.
///
/// Value is chosen based on empirical benchmarks where rayon's thread pool
/// overhead is amortized by computational gains from parallelization.
pub(crate) const RECURRENT_PARALLEL_THRESHOLD: usize = 1024;

/// Applies stable sigmoid activation to an array
///
/// Uses clipping to prevent numerical overflow before computing sigmoid.
#[inline]
pub(crate) fn apply_sigmoid(arr: Array2<f32>) -> Array2<f32> {
    arr.mapv(|x| {
        let clipped_x = x.clamp(-500.0, 500.0);
        1.0 / (1.0 + (-clipped_x).exp())
    })
}

/// Applies stable tanh activation to an array
///
/// Uses clipping to prevent numerical overflow before computing tanh.
#[inline]
pub(crate) fn apply_tanh(arr: Array2<f32>) -> Array2<f32> {
    arr.mapv(|x| {
        let clipped_x = x.clamp(-500.0, 500.0);
        clipped_x.tanh()
    })
}

/// Helper function to extract cache and return error if not available
///
/// This is used during backward pass to ensure forward pass has been run.
///
/// # Parameters
///
/// - `cache` - Cache container to take ownership from
/// - `error_msg` - Error message to use when cache is empty
///
/// # Returns
///
/// - `Result<T, ModelError>` - The cached value if present
///
/// # Errors
///
/// - `ModelError::ProcessingError` - If the cache is empty
#[inline]
pub(crate) fn take_cache<T>(cache: &mut Option<T>, error_msg: &str) -> Result<T, ModelError> {
    cache
        .take()
        .ok_or_else(|| ModelError::ProcessingError(error_msg.to_string()))
}

/// The bidirectional LSTM layer combining both time directions
pub mod bidirectional_lstm;
/// Backpropagation-through-time driver for a single direction
pub(crate) mod bptt;
/// Gate/cell recurrence engine computing a single time step
pub(crate) mod cell;
/// Forward-pass driver iterating a single direction over the time axis
pub(crate) mod fwd_pass;
/// Input validation functions for recurrent layers
mod input_validation_function;
/// Parameter, gradient and continuation-state containers
pub mod params;

pub use bidirectional_lstm::BidirectionalLSTM;
pub use fwd_pass::Direction;
pub use params::{
    DirectionGradients, DirectionState, DirectionWeights, GradientSet, ParamKey, RnnStateBuffer,
};
