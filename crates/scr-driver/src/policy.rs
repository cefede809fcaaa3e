//! Policy selection and lifecycle.

use std::fmt;

use scr_telemetry::{ControlCommand, SensorSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::carry::CarryState;
use crate::manual::{InputReceiver, ManualCapturePolicy};
use crate::model::{ModelAssistedPolicy, ProviderLoader};
use crate::rule_based::{RuleBasedConfig, RuleBasedPolicy};

/// Result of one decision: the command to send and the state for the next
/// cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub command: ControlCommand,
    pub carry: CarryState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    RuleBased,
    ModelAssisted,
    ManualCapture,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicyKind::RuleBased => "rule-based",
            PolicyKind::ModelAssisted => "model-assisted",
            PolicyKind::ManualCapture => "manual-capture",
        })
    }
}

/// Why an episode's policy is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeardownReason {
    /// The session is over; input sources should stop.
    Shutdown,
    /// A new episode follows with a fresh policy.
    Restart,
}

#[derive(Debug)]
pub enum ControlPolicy {
    RuleBased(RuleBasedPolicy),
    ModelAssisted(ModelAssistedPolicy),
    ManualCapture(ManualCapturePolicy),
}

impl ControlPolicy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            ControlPolicy::RuleBased(_) => PolicyKind::RuleBased,
            ControlPolicy::ModelAssisted(_) => PolicyKind::ModelAssisted,
            ControlPolicy::ManualCapture(_) => PolicyKind::ManualCapture,
        }
    }

    pub fn decide(&mut self, snapshot: &SensorSnapshot, carry: CarryState) -> Decision {
        match self {
            ControlPolicy::RuleBased(policy) => policy.decide(snapshot, carry),
            ControlPolicy::ModelAssisted(policy) => policy.decide(snapshot, carry),
            ControlPolicy::ManualCapture(policy) => policy.decide(snapshot, carry),
        }
    }

    /// Release per-episode resources.
    ///
    /// Manual capture discards queued input on restart and additionally stops
    /// the input source on shutdown.
    pub fn teardown(&mut self, reason: TeardownReason) {
        if let ControlPolicy::ManualCapture(policy) = self {
            match reason {
                TeardownReason::Shutdown => policy.input().deactivate(),
                TeardownReason::Restart => {
                    let dropped = policy.input().discard_pending();
                    if dropped > 0 {
                        info!(dropped, "discarded pending manual input");
                    }
                }
            }
        }
    }
}

/// Builds a fresh policy at every episode start.
pub struct PolicyFactory {
    kind: PolicyKind,
    rule_based: RuleBasedConfig,
    loader: Option<Box<dyn ProviderLoader>>,
    input: Option<InputReceiver>,
}

impl fmt::Debug for PolicyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyFactory")
            .field("kind", &self.kind)
            .field("rule_based", &self.rule_based)
            .field("loader", &self.loader.is_some())
            .field("input", &self.input.is_some())
            .finish()
    }
}

impl PolicyFactory {
    pub fn rule_based(config: RuleBasedConfig) -> Self {
        Self {
            kind: PolicyKind::RuleBased,
            rule_based: config,
            loader: None,
            input: None,
        }
    }

    /// Model-assisted driving; falls back to `config` rules if `loader` fails.
    pub fn model_assisted(config: RuleBasedConfig, loader: Box<dyn ProviderLoader>) -> Self {
        Self {
            kind: PolicyKind::ModelAssisted,
            rule_based: config,
            loader: Some(loader),
            input: None,
        }
    }

    pub fn manual_capture(input: InputReceiver) -> Self {
        Self {
            kind: PolicyKind::ManualCapture,
            rule_based: RuleBasedConfig::default(),
            loader: None,
            input: Some(input),
        }
    }

    /// The policy this factory is configured for. [`build`](Self::build) may
    /// still return a rule-based fallback.
    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    pub fn build(&self) -> ControlPolicy {
        match (self.kind, &self.loader, &self.input) {
            (PolicyKind::ModelAssisted, Some(loader), _) => match loader.load() {
                Ok(provider) => {
                    info!("prediction provider loaded");
                    ControlPolicy::ModelAssisted(ModelAssistedPolicy::new(
                        provider,
                        self.rule_based,
                    ))
                }
                Err(e) => {
                    warn!(error = %e, "model unavailable, falling back to rule-based policy");
                    self.fallback()
                }
            },
            (PolicyKind::ManualCapture, _, Some(input)) => {
                ControlPolicy::ManualCapture(ManualCapturePolicy::new(input.clone()))
            }
            _ => self.fallback(),
        }
    }

    fn fallback(&self) -> ControlPolicy {
        ControlPolicy::RuleBased(RuleBasedPolicy::new(self.rule_based))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PredictionError, PredictionResult};
    use crate::manual::{InputEvent, InputSymbol, input_channel};
    use crate::model::PredictionProvider;
    use tracing_test::traced_test;

    fn failing_loader() -> PredictionResult<Box<dyn PredictionProvider>> {
        Err(PredictionError::Unavailable("model.bin missing".to_string()))
    }

    fn working_loader() -> PredictionResult<Box<dyn PredictionProvider>> {
        Ok(Box::new(|_: &[f64]| -> PredictionResult<Vec<f64>> {
            Ok(vec![0.3, 0.0, 0.1, 0.0, 1.0])
        }))
    }

    #[test]
    fn test_rule_based_factory() {
        let factory = PolicyFactory::rule_based(RuleBasedConfig::default());
        assert_eq!(factory.build().kind(), PolicyKind::RuleBased);
    }

    #[test]
    #[traced_test]
    fn test_failed_loader_falls_back_with_warning() {
        let factory =
            PolicyFactory::model_assisted(RuleBasedConfig::default(), Box::new(failing_loader));
        let policy = factory.build();
        assert_eq!(policy.kind(), PolicyKind::RuleBased);
        assert_eq!(factory.kind(), PolicyKind::ModelAssisted);
        assert!(logs_contain("falling back to rule-based policy"));
        assert!(logs_contain("model.bin missing"));
    }

    #[test]
    fn test_loaded_provider_drives() {
        let factory =
            PolicyFactory::model_assisted(RuleBasedConfig::default(), Box::new(working_loader));
        let mut policy = factory.build();
        assert_eq!(policy.kind(), PolicyKind::ModelAssisted);
        let d = policy.decide(&SensorSnapshot::unavailable(), CarryState::new());
        assert_eq!(d.command.accel, 0.3);
    }

    #[test]
    fn test_each_build_is_a_new_instance() {
        let (tx, rx) = input_channel();
        let factory = PolicyFactory::manual_capture(rx);
        let mut first = factory.build();
        let mut second = factory.build();
        tx.send(InputEvent::press(InputSymbol::Accelerate));
        let d = first.decide(&SensorSnapshot::unavailable(), CarryState::new());
        assert_eq!(d.command.accel, 1.0);
        // both share the channel; the event was consumed by the first
        let d = second.decide(&SensorSnapshot::unavailable(), CarryState::new());
        assert_eq!(d.command.accel, 0.0);
    }

    #[test]
    fn test_restart_teardown_discards_pending_input() {
        let (tx, rx) = input_channel();
        let mut policy = PolicyFactory::manual_capture(rx).build();
        tx.send(InputEvent::press(InputSymbol::Accelerate));
        policy.teardown(TeardownReason::Restart);
        assert!(tx.is_active());
        let d = policy.decide(&SensorSnapshot::unavailable(), CarryState::new());
        assert_eq!(d.command.accel, 0.0);
    }

    #[test]
    fn test_shutdown_teardown_deactivates_source() {
        let (tx, rx) = input_channel();
        let mut policy = PolicyFactory::manual_capture(rx).build();
        policy.teardown(TeardownReason::Shutdown);
        assert!(!tx.is_active());
    }

    #[test]
    fn test_policy_kind_display() {
        assert_eq!(PolicyKind::ManualCapture.to_string(), "manual-capture");
        assert_eq!(PolicyKind::default(), PolicyKind::RuleBased);
    }
}
