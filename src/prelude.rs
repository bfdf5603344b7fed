pub use crate::error::ModelError;
pub use crate::neural_network::{
    BidirectionalLSTM, Direction, DirectionGradients, DirectionState, DirectionWeights,
    GradientSet, ParamKey, RecurrentLayer, RnnStateBuffer, Tensor,
};
