/// Module that contains neural network layer implementations
pub mod layer;
/// Module that contains the layer lifecycle traits consumed by a host framework
pub mod traits;

pub use layer::*;
pub use traits::RecurrentLayer;

use crate::ModelError;
use ndarray::ArrayD;

/// Type alias for n-dimensional arrays used as tensors in the neural network
pub type Tensor = ArrayD<f32>;
