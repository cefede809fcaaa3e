//! Learned-model-assisted driving.

use std::fmt;

use scr_telemetry::{SensorSnapshot, feature_vector};
use tracing::{trace, warn};

use crate::carry::CarryState;
use crate::error::{PredictionError, PredictionResult};
use crate::gears::GearStrategy;
use crate::policy::Decision;
use crate::rule_based::{RuleBasedConfig, RuleBasedPolicy};

/// Prediction vector length: accel, brake, steer, clutch, gear hint.
pub const PREDICTION_OUTPUTS: usize = 5;

/// Maps a feature vector (see [`scr_telemetry::feature_names`]) to
/// `[accel, brake, steer, clutch, gear_hint]`.
pub trait PredictionProvider {
    fn predict(&mut self, features: &[f64]) -> PredictionResult<Vec<f64>>;
}

impl<F> PredictionProvider for F
where
    F: FnMut(&[f64]) -> PredictionResult<Vec<f64>>,
{
    fn predict(&mut self, features: &[f64]) -> PredictionResult<Vec<f64>> {
        self(features)
    }
}

/// Builds a provider for each new episode.
pub trait ProviderLoader {
    fn load(&self) -> PredictionResult<Box<dyn PredictionProvider>>;
}

impl<F> ProviderLoader for F
where
    F: Fn() -> PredictionResult<Box<dyn PredictionProvider>>,
{
    fn load(&self) -> PredictionResult<Box<dyn PredictionProvider>> {
        self()
    }
}

/// Analog controls from a prediction provider, gears from the extended rules.
///
/// A cycle whose prediction fails is driven by the rule-based policy instead.
pub struct ModelAssistedPolicy {
    provider: Box<dyn PredictionProvider>,
    fallback: RuleBasedPolicy,
}

impl fmt::Debug for ModelAssistedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAssistedPolicy")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl ModelAssistedPolicy {
    pub fn new(provider: Box<dyn PredictionProvider>, rule_based: RuleBasedConfig) -> Self {
        Self {
            provider,
            fallback: RuleBasedPolicy::new(RuleBasedConfig {
                gear_strategy: GearStrategy::Extended,
                ..rule_based
            }),
        }
    }

    pub fn decide(&mut self, snapshot: &SensorSnapshot, carry: CarryState) -> Decision {
        let features = feature_vector(snapshot);
        match self.predict(&features) {
            Ok(prediction) => self.apply(snapshot, carry, prediction),
            Err(e) => {
                warn!(error = %e, "prediction failed, using rule-based controls for this cycle");
                self.fallback.decide(snapshot, carry)
            }
        }
    }

    fn predict(&mut self, features: &[f64]) -> PredictionResult<[f64; PREDICTION_OUTPUTS]> {
        let outputs = self.provider.predict(features)?;
        <[f64; PREDICTION_OUTPUTS]>::try_from(outputs.as_slice()).map_err(|_| {
            PredictionError::OutputArity {
                expected: PREDICTION_OUTPUTS,
                actual: outputs.len(),
            }
        })
    }

    fn apply(
        &self,
        snapshot: &SensorSnapshot,
        mut carry: CarryState,
        prediction: [f64; PREDICTION_OUTPUTS],
    ) -> Decision {
        // gear hint is ignored; the extended rules pick the gear
        let [accel, brake, steer, clutch, _gear_hint] = prediction;
        let mut command = carry.command;
        command.accel = unit(accel);
        command.brake = unit(brake);
        command.steer = signed_unit(steer);
        command.clutch = unit(clutch);
        command.gear = self
            .fallback
            .gear(snapshot, &carry, command.accel, command.brake);

        trace!(
            accel = command.accel,
            brake = command.brake,
            steer = command.steer,
            gear = command.gear,
            "model-assisted decision"
        );

        carry.remember_rpm(snapshot.rpm);
        carry.command = command;
        Decision { command, carry }
    }
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn signed_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scr_telemetry::FEATURE_COUNT;

    fn fixed(outputs: Vec<f64>) -> Box<dyn PredictionProvider> {
        Box::new(move |_: &[f64]| -> PredictionResult<Vec<f64>> { Ok(outputs.clone()) })
    }

    #[test]
    fn test_prediction_is_clamped() {
        let mut policy = ModelAssistedPolicy::new(
            fixed(vec![1.5, -0.3, -2.0, 0.4, 3.0]),
            RuleBasedConfig::default(),
        );
        let d = policy.decide(&SensorSnapshot::unavailable(), CarryState::new());
        assert_eq!(d.command.accel, 1.0);
        assert_eq!(d.command.brake, 0.0);
        assert_eq!(d.command.steer, -1.0);
        assert_eq!(d.command.clutch, 0.4);
    }

    #[test]
    fn test_provider_sees_full_feature_vector() {
        let provider = |features: &[f64]| {
            if features.len() == FEATURE_COUNT {
                Ok(vec![0.5, 0.0, 0.0, 0.0, 0.0])
            } else {
                Err(PredictionError::Failed(format!("{} features", features.len())))
            }
        };
        let mut policy = ModelAssistedPolicy::new(Box::new(provider), RuleBasedConfig::default());
        let d = policy.decide(&SensorSnapshot::unavailable(), CarryState::new());
        assert_eq!(d.command.accel, 0.5);
    }

    #[test]
    fn test_gear_uses_extended_rules_with_new_pedals() {
        // braking hard while rolling backwards engages reverse
        let mut policy = ModelAssistedPolicy::new(
            fixed(vec![0.0, 0.9, 0.0, 0.0, 4.0]),
            RuleBasedConfig::default(),
        );
        let s = SensorSnapshot::from_message("(gear 0)(rpm 900)(speedX -1.0)");
        let d = policy.decide(&s, CarryState::new());
        assert_eq!(d.command.gear, -1);
        assert_eq!(d.carry.prev_rpm, Some(900.0));
    }

    #[test]
    fn test_wrong_arity_falls_back_for_cycle() {
        let mut policy =
            ModelAssistedPolicy::new(fixed(vec![1.0, 0.0]), RuleBasedConfig::default());
        let s = SensorSnapshot::from_message("(angle 3.0)(trackPos -1.0)(speedX 10)");
        let d = policy.decide(&s, CarryState::new());
        assert_eq!(d.command.steer, 1.0);
        assert!((d.command.accel - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_failed_prediction_falls_back_for_cycle() {
        let provider =
            |_: &[f64]| -> PredictionResult<Vec<f64>> { Err(PredictionError::Failed("nan".into())) };
        let mut policy = ModelAssistedPolicy::new(Box::new(provider), RuleBasedConfig::default());
        let d = policy.decide(
            &SensorSnapshot::from_message("(speedX 10)"),
            CarryState::new(),
        );
        assert!((d.command.accel - 0.1).abs() < 1e-12);
    }
}
