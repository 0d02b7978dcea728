//! Categorical MLP policy trained with vanilla policy gradient
//!
//! Pure ndarray: ReLU hidden layers, a linear logit head over the six arena
//! actions, manual backpropagation and Adam.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform, WeightedIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use arena_rl_core::{
    ArenaAction, Policy, PolicySnapshot, RLError, Result, TrainingBatch, VectorObservation,
};

use crate::optim::Adam;

/// Snapshot family name of [`MlpPolicy`]
pub const MLP_KIND: &str = "mlp-vpg";

/// MLP policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Observation length
    pub input_dim: usize,
    /// Hidden layer sizes
    pub hidden_dims: Vec<usize>,
    /// Adam step size
    pub learning_rate: f32,
    /// Weight of the `mean(log p)` term added to the loss
    pub log_prob_penalty: f32,
    /// Seed for initialization and action sampling
    pub seed: Option<u64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            input_dim: 16,
            hidden_dims: vec![32, 32],
            learning_rate: 5e-3,
            log_prob_penalty: 0.2,
            seed: None,
        }
    }
}

/// Stochastic policy: observation -> hidden ReLU layers -> action logits
pub struct MlpPolicy {
    config: MlpConfig,
    /// `(in, out)` weight matrix per layer
    weights: Vec<Array2<f32>>,
    biases: Vec<Array1<f32>>,
    optimizer: Adam,
    rng: Mutex<StdRng>,
}

impl MlpPolicy {
    /// Create a freshly initialized policy
    #[must_use]
    pub fn new(config: MlpConfig) -> Self {
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let mut weights = Vec::new();
        let mut biases = Vec::new();
        let mut prev_dim = config.input_dim;
        for &dim in config
            .hidden_dims
            .iter()
            .chain(std::iter::once(&ArenaAction::COUNT))
        {
            weights.push(Self::xavier_init(prev_dim, dim, &mut rng));
            biases.push(Array1::zeros(dim));
            prev_dim = dim;
        }

        Self {
            optimizer: Adam::new(config.learning_rate),
            config,
            weights,
            biases,
            rng: Mutex::new(rng),
        }
    }

    /// Xavier uniform initialization
    #[allow(clippy::cast_precision_loss)]
    fn xavier_init(in_dim: usize, out_dim: usize, rng: &mut StdRng) -> Array2<f32> {
        let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
        let dist = Uniform::new_inclusive(-limit, limit);
        Array2::from_shape_fn((in_dim, out_dim), |_| dist.sample(rng))
    }

    /// Configuration the policy was built with
    #[must_use]
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    /// Layer widths, input first, logits last
    #[must_use]
    pub fn architecture(&self) -> Vec<usize> {
        let mut dims = vec![self.config.input_dim];
        dims.extend(self.weights.iter().map(|w| w.ncols()));
        dims
    }

    /// Flattened parameters, layer by layer, weights before biases
    #[must_use]
    pub fn parameters(&self) -> Vec<f32> {
        let mut params = Vec::new();
        for (w, b) in self.weights.iter().zip(&self.biases) {
            params.extend(w.iter().copied());
            params.extend(b.iter().copied());
        }
        params
    }

    /// Overwrite all parameters from a flat vector
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the vector has the wrong length.
    pub fn set_parameters(&mut self, params: &[f32]) -> Result<()> {
        let expected: usize = self
            .weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| w.len() + b.len())
            .sum();
        if params.len() != expected {
            return Err(RLError::DimensionMismatch {
                expected,
                actual: params.len(),
            });
        }

        let mut offset = 0;
        for (w, b) in self.weights.iter_mut().zip(self.biases.iter_mut()) {
            let shape = w.dim();
            *w = Array2::from_shape_vec(shape, params[offset..offset + w.len()].to_vec())
                .map_err(|e| RLError::Policy(e.to_string()))?;
            offset += w.len();
            *b = Array1::from_vec(params[offset..offset + b.len()].to_vec());
            offset += b.len();
        }
        Ok(())
    }

    fn input_row(&self, observation: &VectorObservation) -> Result<Array1<f32>> {
        if observation.len() != self.config.input_dim {
            return Err(RLError::DimensionMismatch {
                expected: self.config.input_dim,
                actual: observation.len(),
            });
        }
        Ok(Array1::from_vec(observation.to_f32()))
    }

    /// Layer activations for a batch; the last entry holds the logits
    fn forward(&self, input: Array2<f32>) -> Vec<Array2<f32>> {
        let last = self.weights.len() - 1;
        let mut activations = Vec::with_capacity(self.weights.len() + 1);
        activations.push(input);
        for (i, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let mut z = activations[i].dot(w) + b;
            if i < last {
                z.mapv_inplace(|v| v.max(0.0));
            }
            activations.push(z);
        }
        activations
    }

    fn log_softmax(logits: &Array2<f32>) -> Array2<f32> {
        let mut out = logits.clone();
        for mut row in out.rows_mut() {
            let max = row.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
            let log_sum = row.mapv(|x| (x - max).exp()).sum().ln() + max;
            row.mapv_inplace(|x| x - log_sum);
        }
        out
    }

    /// Action probabilities for one observation, indexed like [`ArenaAction::ALL`]
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the observation has the wrong length.
    pub fn action_probabilities(&self, observation: &VectorObservation) -> Result<Vec<f64>> {
        let row = self.input_row(observation)?.insert_axis(Axis(0));
        let activations = self.forward(row);
        let logits = activations
            .last()
            .ok_or_else(|| RLError::Policy("network has no layers".into()))?;
        let log_probs = Self::log_softmax(logits);
        Ok(log_probs.iter().map(|&lp| f64::from(lp.exp())).collect())
    }

    fn batch_inputs(&self, batch: &TrainingBatch) -> Result<Array2<f32>> {
        let mut inputs = Array2::zeros((batch.len(), self.config.input_dim));
        for (mut row, observation) in inputs.rows_mut().into_iter().zip(&batch.observations) {
            row.assign(&self.input_row(observation)?);
        }
        Ok(inputs)
    }
}

impl Clone for MlpPolicy {
    /// Independent copy; the sampler continues from the same state
    fn clone(&self) -> Self {
        let rng = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Self {
            config: self.config.clone(),
            weights: self.weights.clone(),
            biases: self.biases.clone(),
            optimizer: self.optimizer.clone(),
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl Policy for MlpPolicy {
    fn input_dim(&self) -> usize {
        self.config.input_dim
    }

    async fn select_action(&self, observation: &VectorObservation) -> Result<ArenaAction> {
        let probs = self.action_probabilities(observation)?;
        let dist = WeightedIndex::new(&probs).map_err(|e| RLError::Policy(e.to_string()))?;
        let index = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| RLError::Policy("sampler lock poisoned".into()))?;
            dist.sample(&mut *rng)
        };
        ArenaAction::try_from(index)
    }

    /// Loss `-mean(log p(a|s) * G) + c * mean(log p(a|s))`
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    async fn update(&mut self, batch: &TrainingBatch) -> Result<f64> {
        if batch.is_empty() {
            return Err(RLError::Policy("cannot update on an empty batch".into()));
        }
        if batch.observations.len() != batch.len() || batch.returns.len() != batch.len() {
            return Err(RLError::DimensionMismatch {
                expected: batch.len(),
                actual: batch.observations.len().min(batch.returns.len()),
            });
        }

        let n = batch.len() as f32;
        let penalty = self.config.log_prob_penalty;
        let activations = self.forward(self.batch_inputs(batch)?);
        let logits = activations
            .last()
            .ok_or_else(|| RLError::Policy("network has no layers".into()))?;
        let log_probs = Self::log_softmax(logits);

        // dL/dlogits = (c - G) / n * (onehot - softmax)
        let mut grad = log_probs.mapv(|lp| -lp.exp());
        let mut loss = 0.0_f64;
        for (i, (action, &ret)) in batch.actions.iter().zip(&batch.returns).enumerate() {
            let a = action.index();
            let weight = ret as f32;
            let log_p = log_probs[[i, a]];
            loss += f64::from((penalty - weight) * log_p);
            grad[[i, a]] += 1.0;
            let scale = (penalty - weight) / n;
            grad.row_mut(i).mapv_inplace(|g| g * scale);
        }
        loss /= f64::from(n);

        let mut weight_grads = Vec::with_capacity(self.weights.len());
        let mut bias_grads = Vec::with_capacity(self.biases.len());
        for layer in (0..self.weights.len()).rev() {
            weight_grads.push(activations[layer].t().dot(&grad));
            bias_grads.push(grad.sum_axis(Axis(0)));
            if layer > 0 {
                let mut upstream = grad.dot(&self.weights[layer].t());
                upstream.zip_mut_with(&activations[layer], |g, &a| {
                    if a <= 0.0 {
                        *g = 0.0;
                    }
                });
                grad = upstream;
            }
        }
        weight_grads.reverse();
        bias_grads.reverse();

        let mut flat_grads = Vec::new();
        for (w, b) in weight_grads.iter().zip(&bias_grads) {
            flat_grads.extend(w.iter().copied());
            flat_grads.extend(b.iter().copied());
        }
        let mut params = self.parameters();
        self.optimizer.step(&mut params, &flat_grads)?;
        self.set_parameters(&params)?;

        debug!(batch = batch.len(), loss, "policy updated");
        Ok(loss)
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            kind: MLP_KIND.to_string(),
            architecture: self.architecture(),
            parameters: self.parameters(),
        }
    }

    fn restore(&mut self, snapshot: &PolicySnapshot) -> Result<()> {
        snapshot.check_compatible(MLP_KIND, &self.architecture())?;
        self.set_parameters(&snapshot.parameters)?;
        self.optimizer.reset();
        Ok(())
    }
}
