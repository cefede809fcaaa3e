//! Hand-tuned driving rules.

use scr_telemetry::SensorSnapshot;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::carry::CarryState;
use crate::gears::{GearInputs, GearStrategy};
use crate::policy::Decision;

const THROTTLE_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleBasedConfig {
    /// Steering angle (rad) that maps to full lock.
    pub steer_lock: f64,
    /// Cruise speed (km/h) the throttle regulates toward.
    pub target_speed: f64,
    pub gear_strategy: GearStrategy,
}

impl Default for RuleBasedConfig {
    fn default() -> Self {
        Self {
            steer_lock: 0.785398,
            target_speed: 100.0,
            gear_strategy: GearStrategy::Simple,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RuleBasedPolicy {
    config: RuleBasedConfig,
}

impl RuleBasedPolicy {
    pub fn new(config: RuleBasedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleBasedConfig {
        &self.config
    }

    pub fn decide(&self, snapshot: &SensorSnapshot, mut carry: CarryState) -> Decision {
        let previous = carry.command;
        let mut command = previous;

        command.steer = self.steer(snapshot);
        // gear first: it sees the throttle of the previous cycle
        command.gear = self.gear(snapshot, &carry, previous.accel, previous.brake);
        command.accel = self.throttle(snapshot, previous.accel);

        trace!(
            steer = command.steer,
            accel = command.accel,
            gear = command.gear,
            "rule-based decision"
        );

        carry.remember_rpm(snapshot.rpm);
        carry.command = command;
        Decision { command, carry }
    }

    /// Steering toward the track axis, 0 without angle or position.
    pub fn steer(&self, snapshot: &SensorSnapshot) -> f64 {
        match (snapshot.angle, snapshot.track_pos) {
            (Some(angle), Some(track_pos)) => {
                let steer = (angle - track_pos * 0.5) / self.config.steer_lock;
                if steer.is_finite() {
                    steer.clamp(-1.0, 1.0)
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    fn throttle(&self, snapshot: &SensorSnapshot, previous: f64) -> f64 {
        match snapshot.speed_x {
            Some(speed) if speed < self.config.target_speed => {
                (previous + THROTTLE_STEP).min(1.0)
            }
            Some(_) => (previous - THROTTLE_STEP).max(0.0),
            None => previous,
        }
    }

    pub(crate) fn gear(
        &self,
        snapshot: &SensorSnapshot,
        carry: &CarryState,
        accel: f64,
        brake: f64,
    ) -> i32 {
        let strategy = self.config.gear_strategy;
        let baseline = snapshot.gear.unwrap_or(carry.command.gear);
        match (snapshot.rpm, snapshot.speed_x) {
            (Some(rpm), Some(speed)) => strategy.select(GearInputs {
                gear: baseline,
                rpm,
                speed,
                accel,
                brake,
                prev_rpm: carry.prev_rpm,
            }),
            _ => strategy.clamp(baseline),
        }
    }
}
