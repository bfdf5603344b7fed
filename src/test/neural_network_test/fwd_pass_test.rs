use super::*;
use crate::neural_network::layer::recurrent_layer::fwd_pass::run_directional;

#[test]
fn test_forwards_output_depends_only_on_past_inputs() {
    let weights = direction_weights(3, 2, 0.4);
    let input = sequence_input(2, 3, 5);

    // Change the input at the last time step only
    let mut altered = input.clone();
    altered
        .index_axis_mut(Axis(2), 4)
        .mapv_inplace(|v| v + 1.0);

    let base = run_directional(&input, &weights, Direction::Forwards, None, false).unwrap();
    let changed = run_directional(&altered, &weights, Direction::Forwards, None, false).unwrap();

    // Outputs before the altered step are untouched, the altered step is not
    for t in 0..4 {
        assert_eq!(
            base.output.index_axis(Axis(2), t),
            changed.output.index_axis(Axis(2), t)
        );
    }
    assert_ne!(
        base.output.index_axis(Axis(2), 4),
        changed.output.index_axis(Axis(2), 4)
    );
}

#[test]
fn test_backwards_output_depends_only_on_future_inputs() {
    let weights = direction_weights(3, 2, 0.4);
    let input = sequence_input(2, 3, 5);

    // Change the input at the first time step only
    let mut altered = input.clone();
    altered
        .index_axis_mut(Axis(2), 0)
        .mapv_inplace(|v| v + 1.0);

    let base = run_directional(&input, &weights, Direction::Backwards, None, false).unwrap();
    let changed = run_directional(&altered, &weights, Direction::Backwards, None, false).unwrap();

    for t in 1..5 {
        assert_eq!(
            base.output.index_axis(Axis(2), t),
            changed.output.index_axis(Axis(2), t)
        );
    }
    assert_ne!(
        base.output.index_axis(Axis(2), 0),
        changed.output.index_axis(Axis(2), 0)
    );
}

#[test]
fn test_backwards_outputs_written_at_original_time_indices() {
    // Running backwards over a sequence must equal running forwards over the
    // time-reversed sequence, with the outputs reversed back
    let weights = direction_weights(3, 2, 1.1);
    let input = sequence_input(2, 3, 5);
    let reversed = input.slice(s![.., .., ..;-1]).to_owned();

    let back = run_directional(&input, &weights, Direction::Backwards, None, false).unwrap();
    let fwd_on_reversed =
        run_directional(&reversed, &weights, Direction::Forwards, None, false).unwrap();

    for t in 0..5 {
        let a = back.output.index_axis(Axis(2), t);
        let b = fwd_on_reversed.output.index_axis(Axis(2), 4 - t);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_last_state_is_final_iteration_step() {
    let weights = direction_weights(3, 2, 0.9);
    let input = sequence_input(2, 3, 4);

    // Forwards iteration ends at the last time index
    let fwd = run_directional(&input, &weights, Direction::Forwards, None, false).unwrap();
    assert_eq!(fwd.last_activation, fwd.output.index_axis(Axis(2), 3).to_owned());

    // Backwards iteration ends at time index 0
    let back = run_directional(&input, &weights, Direction::Backwards, None, false).unwrap();
    assert_eq!(
        back.last_activation,
        back.output.index_axis(Axis(2), 0).to_owned()
    );
}

#[test]
fn test_continuation_state_reproduces_full_pass() {
    let weights = direction_weights(3, 2, 0.2);
    let input = sequence_input(2, 3, 6);
    let first_half = input.slice(s![.., .., 0..3]).to_owned();
    let second_half = input.slice(s![.., .., 3..6]).to_owned();

    let full = run_directional(&input, &weights, Direction::Forwards, None, false).unwrap();

    let seg1 = run_directional(&first_half, &weights, Direction::Forwards, None, false).unwrap();
    let carried = DirectionState {
        activation: seg1.last_activation.clone(),
        mem_cell: seg1.last_mem_cell.clone(),
    };
    let seg2 = run_directional(
        &second_half,
        &weights,
        Direction::Forwards,
        Some(&carried),
        false,
    )
    .unwrap();

    // Segmented recurrence with carried state ends where the full one does
    for (a, b) in seg2
        .last_activation
        .iter()
        .zip(full.last_activation.iter())
    {
        assert_relative_eq!(*a, *b, epsilon = 1e-6);
    }
    for (a, b) in seg2.last_mem_cell.iter().zip(full.last_mem_cell.iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6);
    }
}

#[test]
fn test_continuation_state_shape_mismatch() {
    let weights = direction_weights(3, 2, 0.2);
    let input = sequence_input(2, 3, 4);
    let bad_state = DirectionState {
        activation: Array2::zeros((2, 3)),
        mem_cell: Array2::zeros((2, 3)),
    };

    let result = run_directional(
        &input,
        &weights,
        Direction::Forwards,
        Some(&bad_state),
        false,
    );
    assert!(matches!(
        result,
        Err(crate::ModelError::ShapeMismatch(_))
    ));
}

#[test]
fn test_per_step_record_only_retained_for_backprop() {
    let weights = direction_weights(3, 2, 0.5);
    let input = sequence_input(2, 3, 4);

    let inference = run_directional(&input, &weights, Direction::Forwards, None, false).unwrap();
    assert!(inference.steps.is_empty());

    let training = run_directional(&input, &weights, Direction::Forwards, None, true).unwrap();
    assert_eq!(training.steps.len(), 4);
}
