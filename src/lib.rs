pub use crate::error::ModelError;

/// Module `error` defines the error type shared by every operation in this crate.
pub mod error;

/// Module `neural_network` provides the bidirectional LSTM recurrent layer and its supporting types.
///
/// The centerpiece of this module is [`neural_network::BidirectionalLSTM`], a
/// Graves-style LSTM that runs two independent recurrences over the same
/// sequence, one forward in time and one backward, and sums their output
/// activations elementwise. Both full backpropagation through time and the
/// truncated variant (with continuation state carried across segment
/// boundaries by the caller) are supported.
///
/// # Key components
///
/// - **`BidirectionalLSTM`** - the layer itself, implementing the
///   [`neural_network::RecurrentLayer`] lifecycle trait consumed by a host framework
/// - **`DirectionWeights`** - the concatenated four-gate parameter set of one time direction
/// - **`GradientSet`** - the merged gradients of both directions, one slot per parameter
/// - **`RnnStateBuffer`** - caller-owned continuation state for truncated BPTT
///
/// # Example
/// ```rust
/// use rustybilstm::neural_network::*;
/// use ndarray::Array;
///
/// // Input data: batch_size=2, features=4, timesteps=5
/// let input = Array::ones((2, 4, 5)).into_dyn();
///
/// // A bidirectional LSTM with 4 input features and 3 units per direction
/// let mut layer = BidirectionalLSTM::new(4, 3).unwrap();
///
/// let output = layer.activate(&input, true).unwrap();
/// assert_eq!(output.shape(), &[2, 3, 5]);
///
/// // Gradient of some loss with respect to the output, same shape as the output
/// let epsilon = Array::ones((2, 3, 5)).into_dyn();
/// let (gradients, input_error) = layer.backprop_gradient(&epsilon).unwrap();
/// assert_eq!(input_error.shape(), input.shape());
/// assert_eq!(gradients.iter().count(), 6);
/// ```
pub mod neural_network;

/// A convenience module that re-exports the most commonly used types and traits from this crate.
pub mod prelude;
