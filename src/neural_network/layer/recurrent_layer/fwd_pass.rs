use super::cell::{LstmStep, lstm_step};
use super::*;
use crate::ModelError;
use ndarray::{Array3, Axis};

/// The time direction of a single recurrence over a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Iterates the time axis from the first index to the last
    Forwards,
    /// Iterates the time axis from the last index to the first
    Backwards,
}

impl Direction {
    /// Maps an iteration step to the original time index of the sequence.
    ///
    /// Step 0 is the first step *in iteration order*: time index 0 for the
    /// forwards direction, the last time index for the backwards direction.
    #[inline]
    pub(crate) fn time_index(&self, step: usize, timesteps: usize) -> usize {
        match self {
            Direction::Forwards => step,
            Direction::Backwards => timesteps - 1 - step,
        }
    }
}

/// Result of running one direction's recurrence over a full sequence.
///
/// # Fields
///
/// - `output` - Hidden activations for every step, written at the *original*
///   time indices, shape (batch, units, time)
/// - `last_activation` / `last_mem_cell` - State after the final iteration
///   step, kept for truncated-BPTT continuation, shape (batch, units)
/// - `initial_activation` / `initial_mem_cell` - State the recurrence started
///   from (zeros unless continuation state was supplied)
/// - `steps` - Per-step record in iteration order, retained only when the
///   pass was run for backprop; empty otherwise
pub(crate) struct FwdPassReturn {
    pub output: Array3<f32>,
    pub last_activation: Array2<f32>,
    pub last_mem_cell: Array2<f32>,
    pub initial_activation: Array2<f32>,
    pub initial_mem_cell: Array2<f32>,
    pub steps: Vec<LstmStep>,
}

/// Runs one direction of the recurrence over the whole time axis.
///
/// Iterates the time axis in the given direction, invoking the recurrence
/// engine per step and collecting outputs into a single per-direction output
/// tensor. Outputs of the backwards direction are written back to ascending
/// time positions so they align with forwards-direction outputs.
///
/// # Parameters
///
/// - `input` - The input sequence with shape (batch, input_dim, time)
/// - `weights` - The direction's weight set
/// - `direction` - Which way to walk the time axis
/// - `initial_state` - Continuation state for the first iteration step; zeros when `None`
/// - `for_backprop` - Whether to retain the per-step record needed by BPTT
///
/// # Returns
///
/// - `Ok(FwdPassReturn)` - Output sequence, final state and (optionally) the per-step record
///
/// # Errors
///
/// - `ModelError::ShapeMismatch` - Propagated from the recurrence engine, or
///   if `initial_state` does not match the (batch, units) shape
pub(crate) fn run_directional(
    input: &Array3<f32>,
    weights: &DirectionWeights,
    direction: Direction,
    initial_state: Option<&DirectionState>,
    for_backprop: bool,
) -> Result<FwdPassReturn, ModelError> {
    let (batch, _, timesteps) = input.dim();
    let units = weights.recurrent_weights.nrows();

    let (mut h_prev, mut c_prev) = match initial_state {
        Some(state) => {
            if state.activation.dim() != (batch, units) || state.mem_cell.dim() != (batch, units) {
                return Err(ModelError::ShapeMismatch(format!(
                    "continuation state has shape {:?}/{:?}, expected ({}, {})",
                    state.activation.dim(),
                    state.mem_cell.dim(),
                    batch,
                    units
                )));
            }
            (state.activation.clone(), state.mem_cell.clone())
        }
        None => (
            Array2::<f32>::zeros((batch, units)),
            Array2::<f32>::zeros((batch, units)),
        ),
    };

    let initial_activation = h_prev.clone();
    let initial_mem_cell = c_prev.clone();

    let mut output = Array3::<f32>::zeros((batch, units, timesteps));
    let mut steps = Vec::with_capacity(if for_backprop { timesteps } else { 0 });

    for step in 0..timesteps {
        let t = direction.time_index(step, timesteps);
        let x_t = input.index_axis(Axis(2), t).to_owned(); // (batch, input_dim)

        let result = lstm_step(&x_t, &h_prev, &c_prev, weights)?;

        // Write the activation back at the original time index
        output.index_axis_mut(Axis(2), t).assign(&result.activation);

        h_prev = result.activation.clone();
        c_prev = result.mem_cell.clone();

        if for_backprop {
            steps.push(result);
        }
    }

    Ok(FwdPassReturn {
        output,
        last_activation: h_prev,
        last_mem_cell: c_prev,
        initial_activation,
        initial_mem_cell,
        steps,
    })
}
