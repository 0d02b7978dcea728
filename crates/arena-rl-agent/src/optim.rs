//! Adam over a flat parameter vector

use arena_rl_core::{RLError, Result};

/// Adam optimizer state
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    momentum: Vec<f32>,
    velocity: Vec<f32>,
    t: i32,
}

impl Adam {
    /// Optimizer with the usual betas (0.9, 0.999)
    #[must_use]
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            momentum: Vec::new(),
            velocity: Vec::new(),
            t: 0,
        }
    }

    /// Step size
    #[must_use]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Number of steps taken since the last reset
    #[must_use]
    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Drop moment estimates
    pub fn reset(&mut self) {
        self.momentum.clear();
        self.velocity.clear();
        self.t = 0;
    }

    /// Apply one descent step in place
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when `grads` and `params` differ in length.
    pub fn step(&mut self, params: &mut [f32], grads: &[f32]) -> Result<()> {
        if params.len() != grads.len() {
            return Err(RLError::DimensionMismatch {
                expected: params.len(),
                actual: grads.len(),
            });
        }
        if self.momentum.len() != params.len() {
            self.momentum = vec![0.0; params.len()];
            self.velocity = vec![0.0; params.len()];
            self.t = 0;
        }

        self.t = self.t.saturating_add(1);
        let bias1 = 1.0 - self.beta1.powi(self.t);
        let bias2 = 1.0 - self.beta2.powi(self.t);

        for (i, (param, &grad)) in params.iter_mut().zip(grads).enumerate() {
            self.momentum[i] = self.beta1 * self.momentum[i] + (1.0 - self.beta1) * grad;
            self.velocity[i] = self.beta2 * self.velocity[i] + (1.0 - self.beta2) * grad * grad;
            let m_hat = self.momentum[i] / bias1;
            let v_hat = self.velocity[i] / bias2;
            *param -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(0.01);
        let mut params = vec![1.0, -1.0];
        adam.step(&mut params, &[0.5, -2.0]).unwrap();
        assert_relative_eq!(params[0], 0.99, epsilon = 1e-5);
        assert_relative_eq!(params[1], -0.99, epsilon = 1e-5);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut adam = Adam::new(0.1);
        let mut params = vec![3.0_f32];
        for _ in 0..500 {
            let grad = 2.0 * params[0];
            adam.step(&mut params, &[grad]).unwrap();
        }
        assert!(params[0].abs() < 0.05);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let mut adam = Adam::new(0.1);
        let mut params = vec![0.0; 3];
        assert!(matches!(
            adam.step(&mut params, &[0.0; 2]),
            Err(RLError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }
}
