use super::*;
use crate::ModelError;
use crate::neural_network::layer::recurrent_layer::cell::lstm_step;

#[test]
fn test_lstm_step_matches_scalar_computation() {
    // Single batch entry, single unit: every tensor is 1x1 and the whole
    // step can be recomputed with scalar arithmetic
    let weights = DirectionWeights {
        input_weights: arr2(&[[0.3, -0.5, 0.7, 0.2]]),
        recurrent_weights: arr2(&[[-0.4, 0.6, 0.1, -0.2]]),
        bias: arr2(&[[0.05, 1.0, -0.1, 0.3]]),
    };
    let x_t = arr2(&[[0.5]]);
    let h_prev = arr2(&[[0.2]]);
    let c_prev = arr2(&[[-0.3]]);

    let step = lstm_step(&x_t, &h_prev, &c_prev, &weights).unwrap();

    let sigmoid = |z: f32| 1.0 / (1.0 + (-z).exp());
    let i = sigmoid(0.5 * 0.3 + 0.2 * -0.4 + 0.05);
    let f = sigmoid(0.5 * -0.5 + 0.2 * 0.6 + 1.0);
    let o = sigmoid(0.5 * 0.7 + 0.2 * 0.1 + -0.1);
    let g = (0.5 * 0.2 + 0.2 * -0.2 + 0.3_f32).tanh();
    let c = f * -0.3 + i * g;
    let h = o * c.tanh();

    assert_relative_eq!(step.gates.input_gate[[0, 0]], i, epsilon = 1e-6);
    assert_relative_eq!(step.gates.forget_gate[[0, 0]], f, epsilon = 1e-6);
    assert_relative_eq!(step.gates.output_gate[[0, 0]], o, epsilon = 1e-6);
    assert_relative_eq!(step.gates.candidate_gate[[0, 0]], g, epsilon = 1e-6);
    assert_relative_eq!(step.mem_cell[[0, 0]], c, epsilon = 1e-6);
    assert_relative_eq!(step.mem_cell_tanh[[0, 0]], c.tanh(), epsilon = 1e-6);
    assert_relative_eq!(step.activation[[0, 0]], h, epsilon = 1e-6);
}

#[test]
fn test_lstm_step_gate_ranges() {
    let weights = direction_weights(3, 4, 0.0);
    let x_t = Array::from_shape_fn((2, 3), |(b, f)| (b as f32 - f as f32).cos());
    let h_prev = Array::from_shape_fn((2, 4), |(b, u)| 0.5 * (b as f32 + u as f32).sin());
    let c_prev = Array2::zeros((2, 4));

    let step = lstm_step(&x_t, &h_prev, &c_prev, &weights).unwrap();

    // Sigmoid gates are in (0, 1), the candidate gate is in (-1, 1)
    for v in step
        .gates
        .input_gate
        .iter()
        .chain(step.gates.forget_gate.iter())
        .chain(step.gates.output_gate.iter())
    {
        assert!(*v > 0.0 && *v < 1.0);
    }
    for v in step.gates.candidate_gate.iter() {
        assert!(*v > -1.0 && *v < 1.0);
    }
}

#[test]
fn test_lstm_step_state_shape_mismatch() {
    let weights = direction_weights(3, 4, 0.0);
    let x_t = Array2::<f32>::zeros((2, 3));
    // Hidden state has the wrong unit count
    let h_prev = Array2::<f32>::zeros((2, 5));
    let c_prev = Array2::<f32>::zeros((2, 4));

    let result = lstm_step(&x_t, &h_prev, &c_prev, &weights);
    assert!(matches!(result, Err(ModelError::ShapeMismatch(_))));
}

#[test]
fn test_lstm_step_weight_shape_mismatch() {
    // Input weights sized for 5 features, input carries 3
    let weights = direction_weights(5, 4, 0.0);
    let x_t = Array2::<f32>::zeros((2, 3));
    let h_prev = Array2::<f32>::zeros((2, 4));
    let c_prev = Array2::<f32>::zeros((2, 4));

    let result = lstm_step(&x_t, &h_prev, &c_prev, &weights);
    assert!(matches!(result, Err(ModelError::ShapeMismatch(_))));
}

#[test]
fn test_lstm_step_zero_weights_produce_zero_activation() {
    // With all parameters zero the candidate gate is tanh(0) = 0, so the
    // cell state and hidden activation stay exactly zero
    let weights = DirectionWeights {
        input_weights: Array2::zeros((3, 16)),
        recurrent_weights: Array2::zeros((4, 16)),
        bias: Array2::zeros((1, 16)),
    };
    let x_t = Array::from_shape_fn((2, 3), |(b, f)| (b + f) as f32);
    let h_prev = Array2::zeros((2, 4));
    let c_prev = Array2::zeros((2, 4));

    let step = lstm_step(&x_t, &h_prev, &c_prev, &weights).unwrap();
    assert!(step.activation.iter().all(|v| *v == 0.0));
    assert!(step.mem_cell.iter().all(|v| *v == 0.0));
}
