use super::*;
use crate::ModelError;
use crate::neural_network::layer::recurrent_layer::bptt::backprop_directional;
use crate::neural_network::layer::recurrent_layer::fwd_pass::run_directional;

#[test]
fn test_truncated_bptt_covering_whole_sequence_equals_full_bptt() {
    let weights = direction_weights(3, 2, 0.8);
    let input = sequence_input(2, 3, 5);
    let epsilon = Array::from_shape_fn((2, 2, 5), |(b, u, t)| {
        (0.5 * b as f32 - 0.3 * u as f32 + 0.2 * t as f32).cos()
    });

    let fwd = run_directional(&input, &weights, Direction::Forwards, None, true).unwrap();

    let (full_grads, full_error) =
        backprop_directional(&input, &epsilon, &fwd, &weights, Direction::Forwards, false, 0)
            .unwrap();
    let (trunc_grads, trunc_error) =
        backprop_directional(&input, &epsilon, &fwd, &weights, Direction::Forwards, true, 5)
            .unwrap();

    assert_eq!(full_grads, trunc_grads);
    assert_eq!(full_error, trunc_error);
}

#[test]
fn test_truncation_to_zero_steps_yields_zero_gradients() {
    let weights = direction_weights(3, 2, 0.8);
    let input = sequence_input(2, 3, 5);
    let epsilon = Array3::<f32>::ones((2, 2, 5));

    let fwd = run_directional(&input, &weights, Direction::Forwards, None, true).unwrap();
    let (grads, input_error) =
        backprop_directional(&input, &epsilon, &fwd, &weights, Direction::Forwards, true, 0)
            .unwrap();

    assert!(grads.input_weights.iter().all(|v| *v == 0.0));
    assert!(grads.recurrent_weights.iter().all(|v| *v == 0.0));
    assert!(grads.bias.iter().all(|v| *v == 0.0));
    assert!(input_error.iter().all(|v| *v == 0.0));
}

#[test]
fn test_truncation_limits_input_error_to_recent_steps() {
    let weights = direction_weights(3, 2, 0.8);
    let input = sequence_input(2, 3, 6);
    let epsilon = Array3::<f32>::ones((2, 2, 6));

    let fwd = run_directional(&input, &weights, Direction::Forwards, None, true).unwrap();
    let (_, input_error) =
        backprop_directional(&input, &epsilon, &fwd, &weights, Direction::Forwards, true, 2)
            .unwrap();

    // Only the two most recent forwards steps (t = 4, 5) receive input error
    for t in 0..4 {
        assert!(
            input_error
                .index_axis(Axis(2), t)
                .iter()
                .all(|v| *v == 0.0)
        );
    }
    assert!(
        input_error
            .index_axis(Axis(2), 5)
            .iter()
            .any(|v| *v != 0.0)
    );
}

#[test]
fn test_backwards_direction_truncation_touches_earliest_time_indices() {
    // For the backwards direction the most recent iteration steps are the
    // earliest original time indices
    let weights = direction_weights(3, 2, 0.8);
    let input = sequence_input(2, 3, 6);
    let epsilon = Array3::<f32>::ones((2, 2, 6));

    let back = run_directional(&input, &weights, Direction::Backwards, None, true).unwrap();
    let (_, input_error) =
        backprop_directional(&input, &epsilon, &back, &weights, Direction::Backwards, true, 2)
            .unwrap();

    for t in 2..6 {
        assert!(
            input_error
                .index_axis(Axis(2), t)
                .iter()
                .all(|v| *v == 0.0)
        );
    }
    assert!(
        input_error
            .index_axis(Axis(2), 0)
            .iter()
            .any(|v| *v != 0.0)
    );
}

#[test]
fn test_epsilon_shape_mismatch() {
    let weights = direction_weights(3, 2, 0.8);
    let input = sequence_input(2, 3, 5);
    // Wrong time-axis length
    let epsilon = Array3::<f32>::ones((2, 2, 4));

    let fwd = run_directional(&input, &weights, Direction::Forwards, None, true).unwrap();
    let result =
        backprop_directional(&input, &epsilon, &fwd, &weights, Direction::Forwards, false, 0);
    assert!(matches!(result, Err(ModelError::ShapeMismatch(_))));
}

#[test]
fn test_backprop_requires_per_step_record() {
    let weights = direction_weights(3, 2, 0.8);
    let input = sequence_input(2, 3, 5);
    let epsilon = Array3::<f32>::ones((2, 2, 5));

    // Inference pass does not retain the record
    let fwd = run_directional(&input, &weights, Direction::Forwards, None, false).unwrap();
    let result =
        backprop_directional(&input, &epsilon, &fwd, &weights, Direction::Forwards, false, 0);
    assert!(matches!(result, Err(ModelError::ProcessingError(_))));
}
