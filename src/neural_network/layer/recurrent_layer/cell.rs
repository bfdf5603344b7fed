use super::*;
use crate::ModelError;
use ndarray::s;

/// Post-activation gate values of a single time step.
///
/// # Fields
///
/// - `input_gate` - Input gate values (sigmoid applied), shape (batch, units)
/// - `forget_gate` - Forget gate values (sigmoid applied), shape (batch, units)
/// - `output_gate` - Output gate values (sigmoid applied), shape (batch, units)
/// - `candidate_gate` - Candidate (cell-input) gate values (tanh applied), shape (batch, units)
pub(crate) struct GateActivations {
    pub input_gate: Array2<f32>,
    pub forget_gate: Array2<f32>,
    pub output_gate: Array2<f32>,
    pub candidate_gate: Array2<f32>,
}

/// Everything the recurrence produces at one time step.
///
/// The gate activations, the new memory-cell state, its tanh, and the new
/// hidden activation are all retained because backpropagation through time
/// needs each of them at every step.
pub(crate) struct LstmStep {
    pub gates: GateActivations,
    pub mem_cell: Array2<f32>,
    pub mem_cell_tanh: Array2<f32>,
    pub activation: Array2<f32>,
}

/// Computes one LSTM time step for one direction.
///
/// The four gate pre-activations come from a single pass over the
/// concatenated weight matrices:
/// `z = x_t @ input_weights + h_prev @ recurrent_weights + bias`,
/// split column-wise into input, forget, output and candidate blocks.
/// Sigmoid is applied to the input/forget/output gates and tanh to the
/// candidate gate, then
/// `c_t = f ⊙ c_prev + i ⊙ g` and `h_t = o ⊙ tanh(c_t)`.
///
/// # Parameters
///
/// - `x_t` - Input at the current timestep with shape (batch, input_dim)
/// - `h_prev` - Previous hidden activation with shape (batch, units)
/// - `c_prev` - Previous memory-cell state with shape (batch, units)
/// - `weights` - The direction's weight set
///
/// # Returns
///
/// - `Ok(LstmStep)` - The new state and the cached per-step values
///
/// # Errors
///
/// - `ModelError::ShapeMismatch` - If weight, input or state dimensions are inconsistent
pub(crate) fn lstm_step(
    x_t: &Array2<f32>,
    h_prev: &Array2<f32>,
    c_prev: &Array2<f32>,
    weights: &DirectionWeights,
) -> Result<LstmStep, ModelError> {
    let (batch, input_dim) = x_t.dim();
    let (recurrent_rows, gate_cols) = weights.recurrent_weights.dim();
    let units = recurrent_rows;

    if weights.input_weights.dim() != (input_dim, gate_cols) {
        return Err(ModelError::ShapeMismatch(format!(
            "input weights have shape {:?}, expected ({}, {})",
            weights.input_weights.dim(),
            input_dim,
            gate_cols
        )));
    }
    if gate_cols != 4 * units {
        return Err(ModelError::ShapeMismatch(format!(
            "recurrent weights have shape {:?}, expected ({}, {})",
            weights.recurrent_weights.dim(),
            units,
            4 * units
        )));
    }
    if weights.bias.dim() != (1, 4 * units) {
        return Err(ModelError::ShapeMismatch(format!(
            "bias has shape {:?}, expected (1, {})",
            weights.bias.dim(),
            4 * units
        )));
    }
    if h_prev.dim() != (batch, units) || c_prev.dim() != (batch, units) {
        return Err(ModelError::ShapeMismatch(format!(
            "state has shape {:?}/{:?}, expected ({}, {})",
            h_prev.dim(),
            c_prev.dim(),
            batch,
            units
        )));
    }

    // All four gate pre-activations in one pass: (batch, 4 * units)
    let z = x_t.dot(&weights.input_weights) + h_prev.dot(&weights.recurrent_weights) + &weights.bias;

    let i_raw = z.slice(s![.., 0..units]).to_owned();
    let f_raw = z.slice(s![.., units..2 * units]).to_owned();
    let o_raw = z.slice(s![.., 2 * units..3 * units]).to_owned();
    let g_raw = z.slice(s![.., 3 * units..4 * units]).to_owned();

    // Determine whether to use parallel execution based on computational load
    let use_parallel = batch * units >= RECURRENT_PARALLEL_THRESHOLD;

    // Apply activations to all 4 gates (parallel or sequential)
    let (i_t, f_t, o_t, g_t) = if use_parallel {
        let ((i_t, f_t), (o_t, g_t)) = rayon::join(
            || rayon::join(|| apply_sigmoid(i_raw), || apply_sigmoid(f_raw)),
            || rayon::join(|| apply_sigmoid(o_raw), || apply_tanh(g_raw)),
        );
        (i_t, f_t, o_t, g_t)
    } else {
        (
            apply_sigmoid(i_raw),
            apply_sigmoid(f_raw),
            apply_sigmoid(o_raw),
            apply_tanh(g_raw),
        )
    };

    // Update cell state: c_t = f_t * c_prev + i_t * g_t
    let c_t = &f_t * c_prev + &i_t * &g_t;

    let c_t_tanh = apply_tanh(c_t.clone());

    // Update hidden state: h_t = o_t * tanh(c_t)
    let h_t = &o_t * &c_t_tanh;

    Ok(LstmStep {
        gates: GateActivations {
            input_gate: i_t,
            forget_gate: f_t,
            output_gate: o_t,
            candidate_gate: g_t,
        },
        mem_cell: c_t,
        mem_cell_tanh: c_t_tanh,
        activation: h_t,
    })
}
