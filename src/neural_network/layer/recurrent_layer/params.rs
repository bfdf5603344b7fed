use super::input_validation_function::validate_recurrent_dimensions;
use super::*;
use crate::ModelError;
use ndarray::Array;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;

/// Identifies one of the six trainable parameters of a bidirectional recurrent layer.
///
/// The identifiers are fixed per direction, so the forward-direction and
/// backward-direction parameter sets can never collide when gradients are
/// merged. [`ParamKey::as_str`] yields the string form used by external
/// parameter stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    InputWeightsForwards,
    RecurrentWeightsForwards,
    BiasForwards,
    InputWeightsBackwards,
    RecurrentWeightsBackwards,
    BiasBackwards,
}

impl ParamKey {
    /// All six parameter keys, forward-direction parameters first.
    pub const ALL: [ParamKey; 6] = [
        ParamKey::InputWeightsForwards,
        ParamKey::RecurrentWeightsForwards,
        ParamKey::BiasForwards,
        ParamKey::InputWeightsBackwards,
        ParamKey::RecurrentWeightsBackwards,
        ParamKey::BiasBackwards,
    ];

    /// Returns the fixed string identifier of this parameter.
    ///
    /// # Returns
    ///
    /// * `&'static str` - The identifier used by external parameter stores
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::InputWeightsForwards => "inputWeightsForwards",
            ParamKey::RecurrentWeightsForwards => "recurrentWeightsForwards",
            ParamKey::BiasForwards => "biasForwards",
            ParamKey::InputWeightsBackwards => "inputWeightsBackwards",
            ParamKey::RecurrentWeightsBackwards => "recurrentWeightsBackwards",
            ParamKey::BiasBackwards => "biasBackwards",
        }
    }

    /// Returns the time direction this parameter belongs to.
    pub fn direction(&self) -> Direction {
        match self {
            ParamKey::InputWeightsForwards
            | ParamKey::RecurrentWeightsForwards
            | ParamKey::BiasForwards => Direction::Forwards,
            ParamKey::InputWeightsBackwards
            | ParamKey::RecurrentWeightsBackwards
            | ParamKey::BiasBackwards => Direction::Backwards,
        }
    }
}

/// Trainable parameters of one time direction.
///
/// The four gates (input, forget, output, candidate) are concatenated along
/// the column axis, so a single matrix multiply produces all four gate
/// pre-activations at once.
///
/// # Fields
///
/// - `input_weights` - Weight matrix for input connections with shape (input_dim, 4 * units)
/// - `recurrent_weights` - Weight matrix for recurrent connections with shape (units, 4 * units)
/// - `bias` - Bias vector with shape (1, 4 * units)
pub struct DirectionWeights {
    pub input_weights: Array2<f32>,
    pub recurrent_weights: Array2<f32>,
    pub bias: Array2<f32>,
}

impl DirectionWeights {
    /// Creates direction weights with randomly initialized values.
    ///
    /// Uses Xavier/Glorot initialization for the input weights, a normalized
    /// random initialization for the recurrent weights, and a constant bias
    /// of 1.0 for the forget-gate block (all other bias entries are 0.0).
    ///
    /// # Parameters
    ///
    /// - `input_dim` - Dimensionality of the input features
    /// - `units` - Number of units (neurons) per gate
    ///
    /// # Returns
    ///
    /// - `Result<Self, ModelError>` - A new weight set
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `input_dim` or `units` is 0
    pub fn new(input_dim: usize, units: usize) -> Result<Self, ModelError> {
        validate_recurrent_dimensions(input_dim, units)?;

        // Xavier/Glorot initialization for input weights
        let limit = (6.0 / (input_dim + units) as f32).sqrt();
        let input_weights = Array::random((input_dim, 4 * units), Uniform::new(-limit, limit));

        // Column-normalized random initialization for recurrent weights
        let mut recurrent_weights = Array::random((units, 4 * units), Uniform::new(-1.0, 1.0));
        for mut col in recurrent_weights.columns_mut() {
            let norm = col.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 1e-8 {
                col /= norm;
            }
        }

        // Forget gate bias = 1.0, everything else 0.0
        let mut bias = Array2::<f32>::zeros((1, 4 * units));
        bias.slice_mut(ndarray::s![.., units..2 * units]).fill(1.0);

        Ok(Self {
            input_weights,
            recurrent_weights,
            bias,
        })
    }

    /// Sum of squares of the two weight matrices (bias excluded).
    pub(crate) fn sum_of_squares(&self) -> f32 {
        self.input_weights.mapv(|x| x * x).sum() + self.recurrent_weights.mapv(|x| x * x).sum()
    }

    /// Sum of absolute values of the two weight matrices (bias excluded).
    pub(crate) fn sum_of_abs(&self) -> f32 {
        self.input_weights.mapv(f32::abs).sum() + self.recurrent_weights.mapv(f32::abs).sum()
    }
}

/// Accumulated gradients of one time direction.
///
/// Shapes match the corresponding [`DirectionWeights`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionGradients {
    pub input_weights: Array2<f32>,
    pub recurrent_weights: Array2<f32>,
    pub bias: Array2<f32>,
}

impl DirectionGradients {
    /// Creates zero-filled gradient accumulators for the given layer dimensions.
    pub(crate) fn zeros(input_dim: usize, units: usize) -> Self {
        Self {
            input_weights: Array2::zeros((input_dim, 4 * units)),
            recurrent_weights: Array2::zeros((units, 4 * units)),
            bias: Array2::zeros((1, 4 * units)),
        }
    }
}

/// Gradients of every trainable parameter of a bidirectional recurrent layer.
///
/// One slot per parameter, tagged by direction, so the forward- and
/// backward-direction gradients are disjoint by construction and can be
/// handed to an external optimizer without any key-collision checks.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSet {
    pub forwards: DirectionGradients,
    pub backwards: DirectionGradients,
}

impl GradientSet {
    /// Returns the gradient tensor for the given parameter.
    ///
    /// # Parameters
    ///
    /// * `key` - The parameter identifier
    ///
    /// # Returns
    ///
    /// * `&Array2<f32>` - The gradient tensor for that parameter
    pub fn get(&self, key: ParamKey) -> &Array2<f32> {
        match key {
            ParamKey::InputWeightsForwards => &self.forwards.input_weights,
            ParamKey::RecurrentWeightsForwards => &self.forwards.recurrent_weights,
            ParamKey::BiasForwards => &self.forwards.bias,
            ParamKey::InputWeightsBackwards => &self.backwards.input_weights,
            ParamKey::RecurrentWeightsBackwards => &self.backwards.recurrent_weights,
            ParamKey::BiasBackwards => &self.backwards.bias,
        }
    }

    /// Iterates over all six (parameter, gradient) pairs in a fixed order.
    ///
    /// # Returns
    ///
    /// * An iterator yielding `(ParamKey, &Array2<f32>)` for every parameter
    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, &Array2<f32>)> {
        ParamKey::ALL.iter().map(move |&key| (key, self.get(key)))
    }
}

/// Hidden activation and memory-cell state of one direction at one point in time.
///
/// # Fields
///
/// - `activation` - Hidden activation with shape (batch, units)
/// - `mem_cell` - Memory-cell state with shape (batch, units)
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionState {
    pub activation: Array2<f32>,
    pub mem_cell: Array2<f32>,
}

/// Caller-owned continuation state for truncated BPTT.
///
/// Read at the start of a truncated-BPTT segment and written at its end,
/// carrying each direction's final hidden/cell state across segment
/// boundaries. Owning this buffer externally avoids hidden shared mutable
/// state inside the layer; a fresh (default) buffer starts every recurrence
/// from zeros.
#[derive(Debug, Clone, Default)]
pub struct RnnStateBuffer {
    pub forwards: Option<DirectionState>,
    pub backwards: Option<DirectionState>,
}

impl RnnStateBuffer {
    /// Creates an empty state buffer (all recurrences start from zeros).
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored state of the given direction, if any.
    pub fn get(&self, direction: Direction) -> Option<&DirectionState> {
        match direction {
            Direction::Forwards => self.forwards.as_ref(),
            Direction::Backwards => self.backwards.as_ref(),
        }
    }

    /// Stores the state of the given direction.
    pub fn set(&mut self, direction: Direction, state: DirectionState) {
        match direction {
            Direction::Forwards => self.forwards = Some(state),
            Direction::Backwards => self.backwards = Some(state),
        }
    }

    /// Clears both directions, so the next pass starts from zero state.
    pub fn clear(&mut self) {
        self.forwards = None;
        self.backwards = None;
    }
}
