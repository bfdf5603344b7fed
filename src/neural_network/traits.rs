use super::*;

/// Defines the lifecycle interface for recurrent neural network layers.
///
/// This trait is the contract a recurrent layer fulfills for its enclosing
/// framework: activation over a full sequence, gradient computation through
/// time (full and truncated), single-step advance for streaming inference,
/// and regularization penalty calculation. All methods are synchronous and
/// either produce a complete result or fail with a [`ModelError`].
pub trait RecurrentLayer {
    /// Performs forward propagation over a full input sequence.
    ///
    /// # Parameters
    ///
    /// - `input` - The input sequence tensor with shape \[batch, feature, time\]
    /// - `training` - When `true`, per-step intermediate values are retained
    ///   for a subsequent backward pass
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - The output sequence with shape \[batch, units, time\]
    /// - `Err(ModelError)` - If the input shape is inconsistent with the layer configuration
    fn activate(&mut self, input: &Tensor, training: bool) -> Result<Tensor, ModelError>;

    /// Performs full backpropagation through time.
    ///
    /// # Parameters
    ///
    /// * `epsilon` - Gradient of the loss with respect to this layer's output
    ///   sequence, same shape as the output
    ///
    /// # Returns
    ///
    /// - `Ok((GradientSet, Tensor))` - Gradients for every layer parameter and
    ///   the error to propagate to the previous layer (same shape as the input)
    /// - `Err(ModelError)` - If `epsilon` does not match the recorded output
    ///   shape, or no forward pass has been run in training mode
    fn backprop_gradient(&mut self, epsilon: &Tensor) -> Result<(GradientSet, Tensor), ModelError>;

    /// Performs truncated backpropagation through time.
    ///
    /// Re-runs the forward pass seeded from `state`, walks only the
    /// `tbptt_length` most recent steps of the gradient recurrence, and
    /// stores each direction's final hidden/cell state back into `state` for
    /// the next segment.
    ///
    /// # Parameters
    ///
    /// - `epsilon` - Gradient of the loss with respect to this layer's output sequence
    /// - `tbptt_length` - Maximum number of time steps to walk backward
    /// - `state` - Caller-owned continuation state, read at the start of the
    ///   pass and updated at the end
    ///
    /// # Returns
    ///
    /// - `Ok((GradientSet, Tensor))` - Gradients and the input error, as for
    ///   [`RecurrentLayer::backprop_gradient`]
    /// - `Err(ModelError)` - If shapes are inconsistent or no input has been seen
    fn tbptt_backprop_gradient(
        &mut self,
        epsilon: &Tensor,
        tbptt_length: usize,
        state: &mut RnnStateBuffer,
    ) -> Result<(GradientSet, Tensor), ModelError>;

    /// Performs forward propagation seeded from stored continuation state.
    ///
    /// # Parameters
    ///
    /// - `input` - The input sequence tensor with shape \[batch, feature, time\]
    /// - `training` - When `true`, per-step intermediate values are retained
    /// - `store_last_for_tbptt` - When `true`, each direction's final
    ///   hidden/cell state is written back into `state`
    /// - `state` - Caller-owned continuation state
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - The output sequence with shape \[batch, units, time\]
    /// - `Err(ModelError)` - If shapes are inconsistent with the layer configuration
    fn rnn_activate_using_stored_state(
        &mut self,
        input: &Tensor,
        training: bool,
        store_last_for_tbptt: bool,
        state: &mut RnnStateBuffer,
    ) -> Result<Tensor, ModelError>;

    /// Advances the recurrence by a single time step.
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - The output for the single step, for layer variants that support it
    /// - `Err(ModelError::Unsupported)` - For layer variants that need the
    ///   full sequence before producing any output
    fn rnn_time_step(&mut self, input: &Tensor) -> Result<Tensor, ModelError>;

    /// Calculates the L1 regularization penalty of the layer's weight matrices.
    ///
    /// # Returns
    ///
    /// * `f32` - The penalty value, `0.0` when regularization is disabled
    fn calc_l1(&self) -> f32;

    /// Calculates the L2 regularization penalty of the layer's weight matrices.
    ///
    /// # Returns
    ///
    /// * `f32` - The penalty value, `0.0` when regularization is disabled
    fn calc_l2(&self) -> f32;

    /// Returns the type name of the layer (e.g. "BidirectionalLSTM").
    ///
    /// # Returns
    ///
    /// * `&str` - A string slice representing the layer type
    fn layer_type(&self) -> &str {
        "Unknown"
    }

    /// Returns a description of the output shape of the layer.
    ///
    /// # Returns
    ///
    /// * `String` - A string describing the output dimensions
    fn output_shape(&self) -> String {
        "Unknown".to_string()
    }

    /// Returns the total number of trainable parameters in the layer.
    ///
    /// # Returns
    ///
    /// * `usize` - The count of parameters
    fn param_count(&self) -> usize;
}
