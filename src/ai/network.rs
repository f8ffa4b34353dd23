use rand::Rng;

pub const INPUT_SIZE: usize = 9;
pub const HIDDEN_SIZE: usize = 18;
pub const OUTPUT_SIZE: usize = 9;

/// Flattened board as fed to the network.
pub type StateVector = [f64; INPUT_SIZE];
/// One estimated value per board cell.
pub type ActionValues = [f64; OUTPUT_SIZE];

/// Action-value estimator used by the Q-learning agent.
///
/// The agent only needs a forward evaluation and a single-sample regression
/// step towards a target vector, so tests can swap in fixed-value stubs.
pub trait QFunction {
    /// Estimated value of every action in `state`.
    fn evaluate(&self, state: &StateVector) -> ActionValues;

    /// Move the estimate for `state` towards `target`.
    fn update(&mut self, state: &StateVector, target: &ActionValues);
}

/// Weights and biases of the 9-18-9 network.
///
/// `w1[i][j]` connects input `j` to hidden unit `i`; `w2[i][j]` connects
/// hidden unit `j` to output `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParameters {
    pub w1: [[f64; INPUT_SIZE]; HIDDEN_SIZE],
    pub b1: [f64; HIDDEN_SIZE],
    pub w2: [[f64; HIDDEN_SIZE]; OUTPUT_SIZE],
    pub b2: [f64; OUTPUT_SIZE],
}

impl NetworkParameters {
    pub fn zeros() -> Self {
        NetworkParameters {
            w1: [[0.0; INPUT_SIZE]; HIDDEN_SIZE],
            b1: [0.0; HIDDEN_SIZE],
            w2: [[0.0; HIDDEN_SIZE]; OUTPUT_SIZE],
            b2: [0.0; OUTPUT_SIZE],
        }
    }

    /// Every weight and bias drawn uniformly from [-1, 1].
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut params = Self::zeros();
        params
            .w1
            .iter_mut()
            .flatten()
            .chain(params.b1.iter_mut())
            .chain(params.w2.iter_mut().flatten())
            .chain(params.b2.iter_mut())
            .for_each(|v| *v = rng.random_range(-1.0..=1.0));
        params
    }

    /// Weights as `[layer][output][input]`.
    pub fn weights(&self) -> Vec<Vec<Vec<f64>>> {
        vec![
            self.w1.iter().map(|row| row.to_vec()).collect(),
            self.w2.iter().map(|row| row.to_vec()).collect(),
        ]
    }

    /// Biases as `[layer][index]`.
    pub fn biases(&self) -> Vec<Vec<f64>> {
        vec![self.b1.to_vec(), self.b2.to_vec()]
    }

    /// Overwrite only the indices present in both `weights` and `self`.
    pub fn merge_weights(&mut self, weights: &[Vec<Vec<f64>>]) {
        if let Some(layer) = weights.first() {
            merge_matrix(&mut self.w1[..], layer);
        }
        if let Some(layer) = weights.get(1) {
            merge_matrix(&mut self.w2[..], layer);
        }
    }

    /// Overwrite only the indices present in both `biases` and `self`.
    pub fn merge_biases(&mut self, biases: &[Vec<f64>]) {
        if let Some(layer) = biases.first() {
            merge_row(&mut self.b1, layer);
        }
        if let Some(layer) = biases.get(1) {
            merge_row(&mut self.b2, layer);
        }
    }
}

fn merge_row(dst: &mut [f64], src: &[f64]) {
    dst.iter_mut().zip(src).for_each(|(d, s)| *d = *s);
}

fn merge_matrix<const N: usize>(dst: &mut [[f64; N]], src: &[Vec<f64>]) {
    dst.iter_mut()
        .zip(src)
        .for_each(|(d, s)| merge_row(d, s));
}

/// Two-layer tanh network evaluated neuron by neuron.
#[derive(Debug, Clone)]
pub struct QNetwork {
    params: NetworkParameters,
    learning_rate: f64,
}

impl QNetwork {
    pub fn new(params: NetworkParameters, learning_rate: f64) -> Self {
        QNetwork {
            params,
            learning_rate,
        }
    }

    /// Network with uniformly random parameters.
    pub fn random<R: Rng>(learning_rate: f64, rng: &mut R) -> Self {
        Self::new(NetworkParameters::random(rng), learning_rate)
    }

    pub fn params(&self) -> &NetworkParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut NetworkParameters {
        &mut self.params
    }

    /// Hidden and output activations.
    fn forward(&self, input: &StateVector) -> ([f64; HIDDEN_SIZE], ActionValues) {
        let p = &self.params;

        let mut hidden = [0.0; HIDDEN_SIZE];
        for (i, h) in hidden.iter_mut().enumerate() {
            let sum: f64 = p.w1[i].iter().zip(input).map(|(w, x)| w * x).sum();
            *h = (sum + p.b1[i]).tanh();
        }

        let mut output = [0.0; OUTPUT_SIZE];
        for (i, o) in output.iter_mut().enumerate() {
            let sum: f64 = p.w2[i].iter().zip(&hidden).map(|(w, h)| w * h).sum();
            *o = (sum + p.b2[i]).tanh();
        }

        (hidden, output)
    }
}

impl QFunction for QNetwork {
    fn evaluate(&self, state: &StateVector) -> ActionValues {
        self.forward(state).1
    }

    fn update(&mut self, state: &StateVector, target: &ActionValues) {
        let (hidden, output) = self.forward(state);
        let lr = self.learning_rate;
        let p = &mut self.params;

        let mut output_deltas = [0.0; OUTPUT_SIZE];
        for i in 0..OUTPUT_SIZE {
            output_deltas[i] = (target[i] - output[i]) * (1.0 - output[i] * output[i]);
        }

        // Back-propagate through the pre-update output weights.
        let mut hidden_deltas = [0.0; HIDDEN_SIZE];
        for j in 0..HIDDEN_SIZE {
            let sum: f64 = (0..OUTPUT_SIZE).map(|i| output_deltas[i] * p.w2[i][j]).sum();
            hidden_deltas[j] = sum * (1.0 - hidden[j] * hidden[j]);
        }

        for i in 0..OUTPUT_SIZE {
            for j in 0..HIDDEN_SIZE {
                p.w2[i][j] += lr * output_deltas[i] * hidden[j];
            }
            p.b2[i] += lr * output_deltas[i];
        }

        for i in 0..HIDDEN_SIZE {
            for j in 0..INPUT_SIZE {
                p.w1[i][j] += lr * hidden_deltas[i] * state[j];
            }
            p.b1[i] += lr * hidden_deltas[i];
        }
    }
}
