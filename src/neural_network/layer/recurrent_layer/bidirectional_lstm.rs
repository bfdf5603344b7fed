use super::bptt::backprop_directional;
use super::fwd_pass::{FwdPassReturn, run_directional};
use super::input_validation_function::validate_sequence_tensor;
use super::*;
use crate::ModelError;
use crate::neural_network::{RecurrentLayer, Tensor};
use ndarray::Array3;

/// Bidirectional Long Short-Term Memory (LSTM) neural network layer
///
/// Runs two independent Graves-style LSTM recurrences over the same input
/// sequence, one forward in time and one backward, each with its own weight
/// set. The layer output is the elementwise sum of the two directional
/// output sequences; no separate combination weight exists. Gradients of the
/// two directions are key-disjoint by construction and merged into a single
/// [`GradientSet`], and the back-propagated input errors of the two
/// directions are summed.
///
/// Because the backward-in-time direction needs the whole sequence before it
/// can produce its first output, single-step advance
/// ([`RecurrentLayer::rnn_time_step`]) is unsupported for this layer.
///
/// # Mathematical Operations
///
/// Per direction, for each timestep t (in that direction's iteration order):
/// 1. i_t = σ(x_t · W_i + h_{t-1} · U_i + b_i)  (Input gate)
/// 2. f_t = σ(x_t · W_f + h_{t-1} · U_f + b_f)  (Forget gate)
/// 3. o_t = σ(x_t · W_o + h_{t-1} · U_o + b_o)  (Output gate)
/// 4. g_t = tanh(x_t · W_g + h_{t-1} · U_g + b_g)  (Candidate gate)
/// 5. C_t = f_t ⊙ C_{t-1} + i_t ⊙ g_t  (Cell state update)
/// 6. h_t = o_t ⊙ tanh(C_t)  (Hidden state update)
///
/// and the layer output at time t is `h_t^{forwards} + h_t^{backwards}`.
///
/// # Example
/// ```rust
/// use rustybilstm::neural_network::*;
/// use ndarray::Array;
///
/// // Input: batch_size=2, features=4, timesteps=5
/// let input = Array::ones((2, 4, 5)).into_dyn();
///
/// let mut layer = BidirectionalLSTM::new(4, 3).unwrap();
/// let output = layer.activate(&input, true).unwrap();
/// assert_eq!(output.shape(), &[2, 3, 5]);
///
/// let epsilon = Array::ones((2, 3, 5)).into_dyn();
/// let (gradients, input_error) = layer.backprop_gradient(&epsilon).unwrap();
/// assert_eq!(input_error.shape(), &[2, 4, 5]);
/// assert_eq!(gradients.iter().count(), 6);
/// ```
pub struct BidirectionalLSTM {
    input_dim: usize,
    units: usize,

    forward_weights: DirectionWeights,
    backward_weights: DirectionWeights,

    // Regularization coefficients; a value <= 0 disables the penalty
    l1_coefficient: f32,
    l2_coefficient: f32,

    // Caches for the backward pass
    input_cache: Option<Array3<f32>>,
    fwd_pass_cache: Option<FwdPassReturn>,
    back_pass_cache: Option<FwdPassReturn>,
}

impl BidirectionalLSTM {
    /// Creates a new bidirectional LSTM layer with randomly initialized weights.
    ///
    /// # Parameters
    ///
    /// - `input_dim` - Dimensionality of input features (number of features per timestep)
    /// - `units` - Number of LSTM units per direction (determines output dimensionality)
    ///
    /// # Returns
    ///
    /// - `Result<Self, ModelError>` - A new layer with both directions'
    ///   weights initialized and regularization disabled
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `input_dim` or `units` is 0
    pub fn new(input_dim: usize, units: usize) -> Result<Self, ModelError> {
        Ok(Self {
            input_dim,
            units,
            forward_weights: DirectionWeights::new(input_dim, units)?,
            backward_weights: DirectionWeights::new(input_dim, units)?,
            l1_coefficient: 0.0,
            l2_coefficient: 0.0,
            input_cache: None,
            fwd_pass_cache: None,
            back_pass_cache: None,
        })
    }

    /// Sets the L1 and L2 regularization coefficients.
    ///
    /// A coefficient less than or equal to 0 disables the corresponding penalty.
    pub fn set_regularization(&mut self, l1: f32, l2: f32) {
        self.l1_coefficient = l1;
        self.l2_coefficient = l2;
    }

    /// Returns the input dimension of the layer
    pub fn get_input_dim(&self) -> usize {
        self.input_dim
    }

    /// Returns the number of LSTM units per direction
    pub fn get_units(&self) -> usize {
        self.units
    }

    /// Returns a reference to the named parameter tensor.
    ///
    /// # Parameters
    ///
    /// * `key` - The parameter identifier
    ///
    /// # Returns
    ///
    /// * `&Array2<f32>` - The parameter tensor
    pub fn get_param(&self, key: ParamKey) -> &Array2<f32> {
        match key {
            ParamKey::InputWeightsForwards => &self.forward_weights.input_weights,
            ParamKey::RecurrentWeightsForwards => &self.forward_weights.recurrent_weights,
            ParamKey::BiasForwards => &self.forward_weights.bias,
            ParamKey::InputWeightsBackwards => &self.backward_weights.input_weights,
            ParamKey::RecurrentWeightsBackwards => &self.backward_weights.recurrent_weights,
            ParamKey::BiasBackwards => &self.backward_weights.bias,
        }
    }

    /// Replaces the named parameter tensor.
    ///
    /// # Parameters
    ///
    /// - `key` - The parameter identifier
    /// - `value` - The new parameter tensor; must match the current shape
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - If `value` does not match the parameter's shape
    pub fn set_param(&mut self, key: ParamKey, value: Array2<f32>) -> Result<(), ModelError> {
        let current = self.get_param(key);
        if value.dim() != current.dim() {
            return Err(ModelError::ShapeMismatch(format!(
                "parameter {} has shape {:?}, replacement has shape {:?}",
                key.as_str(),
                current.dim(),
                value.dim()
            )));
        }
        let slot = match key {
            ParamKey::InputWeightsForwards => &mut self.forward_weights.input_weights,
            ParamKey::RecurrentWeightsForwards => &mut self.forward_weights.recurrent_weights,
            ParamKey::BiasForwards => &mut self.forward_weights.bias,
            ParamKey::InputWeightsBackwards => &mut self.backward_weights.input_weights,
            ParamKey::RecurrentWeightsBackwards => &mut self.backward_weights.recurrent_weights,
            ParamKey::BiasBackwards => &mut self.backward_weights.bias,
        };
        *slot = value;
        Ok(())
    }

    /// Computes the gradient directly from a layer error, without BPTT.
    ///
    /// # Errors
    ///
    /// - `ModelError::Unsupported` - Always; only gradient computation through
    ///   [`RecurrentLayer::backprop_gradient`] is implemented for this layer
    pub fn calc_gradient(
        &self,
        _layer_error: &Tensor,
        _activation: &Tensor,
    ) -> Result<GradientSet, ModelError> {
        Err(ModelError::Unsupported(
            "direct gradient computation is not implemented for this layer; use backprop_gradient",
        ))
    }

    /// Returns a transposed view of this layer.
    ///
    /// # Errors
    ///
    /// - `ModelError::Unsupported` - Always; transposing a bidirectional
    ///   recurrent layer is not implemented
    pub fn transpose(&self) -> Result<Self, ModelError> {
        Err(ModelError::Unsupported(
            "transpose is not implemented for this layer",
        ))
    }

    /// Runs both directions over the input and sums their outputs.
    ///
    /// When `initial_states` is provided, each direction starts from its slot
    /// of the buffer instead of zeros. Returns both directional pass results
    /// so callers can cache them or harvest their final states.
    fn activate_both_directions(
        &self,
        input: &Array3<f32>,
        initial_states: Option<&RnnStateBuffer>,
        for_backprop: bool,
    ) -> Result<(FwdPassReturn, FwdPassReturn), ModelError> {
        let (fwd, back) = rayon::join(
            || {
                run_directional(
                    input,
                    &self.forward_weights,
                    Direction::Forwards,
                    initial_states.and_then(|s| s.get(Direction::Forwards)),
                    for_backprop,
                )
            },
            || {
                run_directional(
                    input,
                    &self.backward_weights,
                    Direction::Backwards,
                    initial_states.and_then(|s| s.get(Direction::Backwards)),
                    for_backprop,
                )
            },
        );
        Ok((fwd?, back?))
    }

    /// Runs truncated or full BPTT for both directions and merges the results.
    fn backprop_both_directions(
        &self,
        input: &Array3<f32>,
        epsilon: &Array3<f32>,
        fwd: &FwdPassReturn,
        back: &FwdPassReturn,
        truncated: bool,
        tbptt_length: usize,
    ) -> Result<(GradientSet, Tensor), ModelError> {
        let (forwards_result, backwards_result) = rayon::join(
            || {
                backprop_directional(
                    input,
                    epsilon,
                    fwd,
                    &self.forward_weights,
                    Direction::Forwards,
                    truncated,
                    tbptt_length,
                )
            },
            || {
                backprop_directional(
                    input,
                    epsilon,
                    back,
                    &self.backward_weights,
                    Direction::Backwards,
                    truncated,
                    tbptt_length,
                )
            },
        );
        let (forwards_gradient, forwards_epsilon) = forwards_result?;
        let (backwards_gradient, backwards_epsilon) = backwards_result?;

        // The two directions' parameters are disjoint, so the merge is a
        // plain placement into the two halves of the gradient set
        let combined_gradient = GradientSet {
            forwards: forwards_gradient,
            backwards: backwards_gradient,
        };

        // Sum the errors that were back-propagated
        let combined_epsilon = forwards_epsilon + backwards_epsilon;

        Ok((combined_gradient, combined_epsilon.into_dyn()))
    }
}

impl RecurrentLayer for BidirectionalLSTM {
    fn activate(&mut self, input: &Tensor, training: bool) -> Result<Tensor, ModelError> {
        let x3 = validate_sequence_tensor(input, self.input_dim, "input")?;

        let (fwd, back) = self.activate_both_directions(&x3, None, training)?;

        // Sum outputs: this sum IS the layer output
        let total_output = &fwd.output + &back.output;

        if training {
            self.input_cache = Some(x3);
            self.fwd_pass_cache = Some(fwd);
            self.back_pass_cache = Some(back);
        }

        Ok(total_output.into_dyn())
    }

    fn backprop_gradient(&mut self, epsilon: &Tensor) -> Result<(GradientSet, Tensor), ModelError> {
        let eps3 = validate_sequence_tensor(epsilon, self.units, "epsilon")?;

        let error_msg = "Forward pass has not been run in training mode";
        let input = take_cache(&mut self.input_cache, error_msg)?;
        let fwd = take_cache(&mut self.fwd_pass_cache, error_msg)?;
        let back = take_cache(&mut self.back_pass_cache, error_msg)?;

        self.backprop_both_directions(&input, &eps3, &fwd, &back, false, 0)
    }

    fn tbptt_backprop_gradient(
        &mut self,
        epsilon: &Tensor,
        tbptt_length: usize,
        state: &mut RnnStateBuffer,
    ) -> Result<(GradientSet, Tensor), ModelError> {
        let eps3 = validate_sequence_tensor(epsilon, self.units, "epsilon")?;

        let error_msg = "No input sequence available; run activate first";
        let input = take_cache(&mut self.input_cache, error_msg)?;
        // Any record retained by activate belongs to a zero-state pass, not
        // to this continuation segment
        self.fwd_pass_cache = None;
        self.back_pass_cache = None;

        let (fwd, back) = self.activate_both_directions(&input, Some(state), true)?;

        // Store each direction's own final step for the next segment
        state.set(
            Direction::Forwards,
            DirectionState {
                activation: fwd.last_activation.clone(),
                mem_cell: fwd.last_mem_cell.clone(),
            },
        );
        state.set(
            Direction::Backwards,
            DirectionState {
                activation: back.last_activation.clone(),
                mem_cell: back.last_mem_cell.clone(),
            },
        );

        self.backprop_both_directions(&input, &eps3, &fwd, &back, true, tbptt_length)
    }

    fn rnn_activate_using_stored_state(
        &mut self,
        input: &Tensor,
        training: bool,
        store_last_for_tbptt: bool,
        state: &mut RnnStateBuffer,
    ) -> Result<Tensor, ModelError> {
        let x3 = validate_sequence_tensor(input, self.input_dim, "input")?;

        let (fwd, back) = self.activate_both_directions(&x3, Some(state), training)?;

        if store_last_for_tbptt {
            state.set(
                Direction::Forwards,
                DirectionState {
                    activation: fwd.last_activation.clone(),
                    mem_cell: fwd.last_mem_cell.clone(),
                },
            );
            state.set(
                Direction::Backwards,
                DirectionState {
                    activation: back.last_activation.clone(),
                    mem_cell: back.last_mem_cell.clone(),
                },
            );
        }

        let total_output = &fwd.output + &back.output;

        if training {
            self.input_cache = Some(x3);
            self.fwd_pass_cache = Some(fwd);
            self.back_pass_cache = Some(back);
        }

        Ok(total_output.into_dyn())
    }

    fn rnn_time_step(&mut self, _input: &Tensor) -> Result<Tensor, ModelError> {
        Err(ModelError::Unsupported(
            "cannot time step a bidirectional RNN; it has to run on the full sequence at once",
        ))
    }

    fn calc_l1(&self) -> f32 {
        if self.l1_coefficient <= 0.0 {
            return 0.0;
        }
        self.l1_coefficient
            * (self.forward_weights.sum_of_abs() + self.backward_weights.sum_of_abs())
    }

    fn calc_l2(&self) -> f32 {
        if self.l2_coefficient <= 0.0 {
            return 0.0;
        }
        0.5 * self.l2_coefficient
            * (self.forward_weights.sum_of_squares() + self.backward_weights.sum_of_squares())
    }

    fn layer_type(&self) -> &str {
        "BidirectionalLSTM"
    }

    fn output_shape(&self) -> String {
        format!("(None, {}, None)", self.units)
    }

    fn param_count(&self) -> usize {
        // Two directions, each with input weights, recurrent weights and bias
        2 * (self.input_dim * 4 * self.units + self.units * 4 * self.units + 4 * self.units)
    }
}
