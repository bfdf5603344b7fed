use super::*;

/// Recurrent layer implementations (bidirectional LSTM and its building blocks)
pub mod recurrent_layer;

pub use recurrent_layer::*;
