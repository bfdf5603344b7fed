use super::fwd_pass::FwdPassReturn;
use super::*;
use crate::ModelError;
use ndarray::{Array3, Axis, s};

/// Runs backpropagation through time for one direction.
///
/// Walks the iteration steps of the matching forward pass in reverse,
/// carrying an accumulating future hidden-state gradient and future
/// cell-state gradient that start at zero. At each step the epsilon at the
/// original time index is combined with the future hidden gradient, pushed
/// through the output gate, tanh(cell) and the forget/input/candidate gates
/// using the cached per-step activations, and turned into weight, bias and
/// input-error contributions.
///
/// # Parameters
///
/// - `input` - The input sequence the forward pass saw, shape (batch, input_dim, time)
/// - `epsilon` - Gradient of the loss w.r.t. this direction's output, same shape as the output
/// - `fwd` - The per-step record produced by the matching forward pass
/// - `weights` - The direction's weight set
/// - `direction` - The direction the forward pass ran in
/// - `truncated` - Whether to limit the walk to the most recent steps
/// - `tbptt_length` - Maximum number of steps to walk when `truncated` is true
///
/// # Returns
///
/// - `Ok((DirectionGradients, Array3<f32>))` - Accumulated parameter
///   gradients and the per-step input error to propagate to the previous
///   layer, shape (batch, input_dim, time)
///
/// # Errors
///
/// - `ModelError::ShapeMismatch` - If `epsilon` does not match the recorded output shape
/// - `ModelError::ProcessingError` - If the forward pass did not retain its per-step record
pub(crate) fn backprop_directional(
    input: &Array3<f32>,
    epsilon: &Array3<f32>,
    fwd: &FwdPassReturn,
    weights: &DirectionWeights,
    direction: Direction,
    truncated: bool,
    tbptt_length: usize,
) -> Result<(DirectionGradients, Array3<f32>), ModelError> {
    if epsilon.dim() != fwd.output.dim() {
        return Err(ModelError::ShapeMismatch(format!(
            "epsilon has shape {:?}, recorded output has shape {:?}",
            epsilon.dim(),
            fwd.output.dim()
        )));
    }

    let (batch, input_dim, timesteps) = input.dim();
    let units = weights.recurrent_weights.nrows();

    if fwd.steps.len() != timesteps {
        return Err(ModelError::ProcessingError(
            "forward pass record is incomplete; run the forward pass for backprop first"
                .to_string(),
        ));
    }

    let mut grads = DirectionGradients::zeros(input_dim, units);
    let mut input_error = Array3::<f32>::zeros((batch, input_dim, timesteps));

    let mut grad_h_future = Array2::<f32>::zeros((batch, units));
    let mut grad_c_future = Array2::<f32>::zeros((batch, units));

    // Truncated BPTT only walks the most recent segment of the recurrence
    let first_step = if truncated && tbptt_length < timesteps {
        timesteps - tbptt_length
    } else {
        0
    };

    // Determine whether to use parallel execution based on computational load
    let use_parallel = batch * units >= RECURRENT_PARALLEL_THRESHOLD;

    // Backpropagation through time, in reverse iteration order
    for step in (first_step..timesteps).rev() {
        let t = direction.time_index(step, timesteps);
        let record = &fwd.steps[step];

        let (h_prev, c_prev) = if step == 0 {
            (&fwd.initial_activation, &fwd.initial_mem_cell)
        } else {
            (&fwd.steps[step - 1].activation, &fwd.steps[step - 1].mem_cell)
        };

        let i_t = &record.gates.input_gate;
        let f_t = &record.gates.forget_gate;
        let o_t = &record.gates.output_gate;
        let g_t = &record.gates.candidate_gate;
        let c_t_tanh = &record.mem_cell_tanh;

        // Total hidden gradient: epsilon at this time index plus what flowed back
        let grad_h = epsilon.index_axis(Axis(2), t).to_owned() + &grad_h_future;

        // Gradient through h_t = o_t * tanh(c_t)
        let grad_o_t = &grad_h * c_t_tanh;
        let grad_c = grad_c_future + &(&grad_h * o_t * &(1.0 - c_t_tanh * c_t_tanh));

        // Gradient through c_t = f_t * c_prev + i_t * g_t
        let grad_f_t = &grad_c * c_prev;
        let grad_i_t = &grad_c * g_t;
        let grad_g_t = &grad_c * i_t;
        let grad_c_prev = &grad_c * f_t;

        // Compute gate activation derivatives (parallel or sequential)
        let (grad_i_raw, grad_f_raw, grad_o_raw, grad_g_raw) = if use_parallel {
            let ((grad_i_raw, grad_f_raw), (grad_o_raw, grad_g_raw)) = rayon::join(
                || {
                    rayon::join(
                        || &grad_i_t * i_t * &(1.0 - i_t), // sigmoid derivative
                        || &grad_f_t * f_t * &(1.0 - f_t), // sigmoid derivative
                    )
                },
                || {
                    rayon::join(
                        || &grad_o_t * o_t * &(1.0 - o_t), // sigmoid derivative
                        || &grad_g_t * &(1.0 - g_t * g_t), // tanh derivative
                    )
                },
            );
            (grad_i_raw, grad_f_raw, grad_o_raw, grad_g_raw)
        } else {
            (
                &grad_i_t * i_t * &(1.0 - i_t), // sigmoid derivative
                &grad_f_t * f_t * &(1.0 - f_t), // sigmoid derivative
                &grad_o_t * o_t * &(1.0 - o_t), // sigmoid derivative
                &grad_g_t * &(1.0 - g_t * g_t), // tanh derivative
            )
        };

        // Assemble the concatenated gate-error block: (batch, 4 * units)
        let mut grad_z = Array2::<f32>::zeros((batch, 4 * units));
        grad_z.slice_mut(s![.., 0..units]).assign(&grad_i_raw);
        grad_z
            .slice_mut(s![.., units..2 * units])
            .assign(&grad_f_raw);
        grad_z
            .slice_mut(s![.., 2 * units..3 * units])
            .assign(&grad_o_raw);
        grad_z
            .slice_mut(s![.., 3 * units..4 * units])
            .assign(&grad_g_raw);

        let x_t = input.index_axis(Axis(2), t).to_owned();

        // Accumulate parameter gradients
        grads.input_weights = grads.input_weights + &x_t.t().dot(&grad_z);
        grads.recurrent_weights = grads.recurrent_weights + &h_prev.t().dot(&grad_z);
        grads.bias = grads.bias + &grad_z.sum_axis(Axis(0)).insert_axis(Axis(0));

        // Error to propagate to the previous layer, at the original time index
        let dx = grad_z.dot(&weights.input_weights.t());
        input_error.index_axis_mut(Axis(2), t).assign(&dx);

        // Gradients flowing to the next (earlier) iteration step
        grad_h_future = grad_z.dot(&weights.recurrent_weights.t());
        grad_c_future = grad_c_prev;
    }

    Ok((grads, input_error))
}
