//! Environment wrappers

use async_trait::async_trait;

use arena_rl_core::{
    ArenaAction, Environment, RLError, Result, Simulation, Step, VectorObservation,
};

use crate::exploration::ExplorationEnv;

/// Default clip range applied after normalization
pub const DEFAULT_CLIP: (f64, f64) = (-5.0, 5.0);

/// Observation normalization wrapper
///
/// Each feature becomes `(x - mean) / std`, clipped. The statistics are fixed
/// at construction, so a saved policy sees the same inputs after a restore.
/// The inner environment keeps emitting raw features.
#[derive(Debug, Clone)]
pub struct Normalize<E> {
    env: E,
    mean: Vec<f64>,
    std: Vec<f64>,
    clip_range: Option<(f64, f64)>,
}

impl<E: Environment> Normalize<E> {
    /// Wrap `env` with explicit per-feature statistics
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when the statistics do not match the observation
    /// arity, `InvalidConfig` when a spread is not a positive finite number.
    pub fn new(env: E, mean: Vec<f64>, std: Vec<f64>) -> Result<Self> {
        let dim = env.observation_dim();
        for len in [mean.len(), std.len()] {
            if len != dim {
                return Err(RLError::DimensionMismatch {
                    expected: dim,
                    actual: len,
                });
            }
        }
        if mean.iter().any(|m| !m.is_finite()) || std.iter().any(|s| !(s.is_finite() && *s > 0.0))
        {
            return Err(RLError::InvalidConfig(
                "normalization statistics must be finite with positive spread".into(),
            ));
        }
        Ok(Self {
            env,
            mean,
            std,
            clip_range: Some(DEFAULT_CLIP),
        })
    }
}

impl<E> Normalize<E> {
    /// Replace the clip range; `None` disables clipping
    #[must_use]
    pub fn with_clip(mut self, clip_range: Option<(f64, f64)>) -> Self {
        self.clip_range = clip_range;
        self
    }

    /// The wrapped environment
    #[must_use]
    pub fn inner(&self) -> &E {
        &self.env
    }

    /// Unwrap
    pub fn into_inner(self) -> E {
        self.env
    }

    /// Normalize one observation
    ///
    /// Vectors of the wrong length pass through untouched so the runner's
    /// validation reports them; NaN stays NaN.
    #[must_use]
    pub fn normalize(&self, observation: &VectorObservation) -> VectorObservation {
        if observation.len() != self.mean.len() {
            return observation.clone();
        }
        let data = observation
            .data
            .iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(&x, (&mean, &std))| {
                let z = (x - mean) / std;
                match self.clip_range {
                    Some((min, max)) => z.clamp(min, max),
                    None => z,
                }
            })
            .collect();
        VectorObservation::new(data)
    }
}

impl<S: Simulation> Normalize<ExplorationEnv<S>> {
    /// Normalize an exploration environment with statistics derived from its
    /// map geometry
    #[must_use]
    pub fn exploration(env: ExplorationEnv<S>) -> Self {
        let (mean, std) = env.feature_stats();
        Self {
            env,
            mean,
            std,
            clip_range: Some(DEFAULT_CLIP),
        }
    }
}

#[async_trait]
impl<E: Environment> Environment for Normalize<E> {
    fn observation_dim(&self) -> usize {
        self.env.observation_dim()
    }

    async fn reset(&mut self) -> Result<VectorObservation> {
        let observation = self.env.reset().await?;
        Ok(self.normalize(&observation))
    }

    async fn step(&mut self, action: ArenaAction) -> Result<Step> {
        let mut step = self.env.step(action).await?;
        step.observation = self.normalize(&step.observation);
        Ok(step)
    }

    fn set_render(&mut self, enabled: bool) {
        self.env.set_render(enabled);
    }

    async fn render(&self) -> Result<()> {
        self.env.render().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExplorationConfig;

    #[tokio::test]
    async fn test_arena_start_is_scaled_into_unit_range() {
        let mut env = Normalize::exploration(ExplorationEnv::arena(ExplorationConfig {
            seed: Some(1),
            ..ExplorationConfig::default()
        }));
        let raw = env.inner().clone().reset().await.unwrap();
        let scaled = env.reset().await.unwrap();

        assert_eq!(scaled.len(), raw.len());
        assert!(raw.data[3] > 100.0);
        assert!(scaled.data.iter().all(|v| v.abs() <= 1.5));
        // facing up (code 0) sits at the bottom of its range
        assert!((scaled.data[2] + 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_steps_are_normalized_too() {
        let mut env = Normalize::exploration(ExplorationEnv::arena(ExplorationConfig::default()));
        env.reset().await.unwrap();
        let step = env.step(ArenaAction::Right).await.unwrap();
        assert!(step.observation.data.iter().all(|v| v.abs() <= 1.5));
    }

    #[test]
    fn test_clip_and_passthrough() {
        let env = ExplorationEnv::arena(ExplorationConfig::default());
        let wrapped = Normalize::new(env, vec![0.0; 16], vec![1.0; 16]).unwrap();
        let mut data = vec![0.0; 16];
        data[0] = 40.0;
        assert!((wrapped.normalize(&VectorObservation::new(data)).data[0] - 5.0).abs() < 1e-12);
        assert_eq!(wrapped.normalize(&VectorObservation::new(vec![9.0])).data, vec![9.0]);
    }

    #[test]
    fn test_rejects_bad_statistics() {
        let env = ExplorationEnv::arena(ExplorationConfig::default());
        assert!(matches!(
            Normalize::new(env.clone(), vec![0.0; 3], vec![1.0; 3]),
            Err(RLError::DimensionMismatch { expected: 16, actual: 3 })
        ));
        assert!(matches!(
            Normalize::new(env, vec![0.0; 16], vec![0.0; 16]),
            Err(RLError::InvalidConfig(_))
        ));
    }
}
