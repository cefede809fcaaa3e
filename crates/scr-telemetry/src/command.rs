//! Outbound actuator command.

use scr_codec::OutboundMessage;
use serde::{Deserialize, Serialize};

pub const MIN_GEAR: i32 = -1;
pub const NEUTRAL_GEAR: i32 = 0;
pub const MAX_GEAR: i32 = 6;

/// Actuator values sent to the server once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    /// Throttle, 0..=1.
    pub accel: f64,
    /// Brake, 0..=1.
    pub brake: f64,
    /// -1 reverse, 0 neutral, 1..=6 forward.
    pub gear: i32,
    /// Steering, -1 full right ..= +1 full left.
    pub steer: f64,
    /// Clutch, 0..=1.
    pub clutch: f64,
    /// Requested focus sensor direction (degrees).
    pub focus: i32,
    /// 1 asks the server to restart the race.
    pub meta: i32,
}

impl Default for ControlCommand {
    fn default() -> Self {
        Self {
            accel: 0.0,
            brake: 0.0,
            gear: 1,
            steer: 0.0,
            clutch: 0.0,
            focus: 0,
            meta: 0,
        }
    }
}

impl ControlCommand {
    /// Copy with every value forced into its legal range.
    ///
    /// Non-finite analog values become 0.
    pub fn sanitized(&self) -> Self {
        Self {
            accel: sanitize_unit_interval(self.accel),
            brake: sanitize_unit_interval(self.brake),
            gear: self.gear.clamp(MIN_GEAR, MAX_GEAR),
            steer: sanitize_signed_unit(self.steer),
            clutch: sanitize_unit_interval(self.clutch),
            focus: self.focus,
            meta: self.meta,
        }
    }

    /// Outbound groups in wire order, sanitized.
    pub fn to_message(&self) -> OutboundMessage {
        let safe = self.sanitized();
        OutboundMessage::new()
            .with("accel", safe.accel)
            .with("brake", safe.brake)
            .with("gear", safe.gear)
            .with("steer", safe.steer)
            .with("clutch", safe.clutch)
            .with("focus", safe.focus)
            .with("meta", safe.meta)
    }

    pub fn encode(&self) -> String {
        self.to_message().encode()
    }
}

fn sanitize_unit_interval(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn sanitize_signed_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cmd = ControlCommand::default();
        assert_eq!(cmd.gear, 1);
        assert_eq!(cmd.accel, 0.0);
        assert_eq!(cmd.meta, 0);
    }

    #[test]
    fn test_default_encoding() {
        assert_eq!(
            ControlCommand::default().encode(),
            "(accel 0.0)(brake 0.0)(gear 1)(steer 0.0)(clutch 0.0)(focus 0)(meta 0)"
        );
    }

    #[test]
    fn test_sanitize_clamps_ranges() {
        let cmd = ControlCommand {
            accel: 1.7,
            brake: -0.2,
            gear: 9,
            steer: -3.0,
            clutch: 0.5,
            focus: 0,
            meta: 0,
        }
        .sanitized();
        assert_eq!(cmd.accel, 1.0);
        assert_eq!(cmd.brake, 0.0);
        assert_eq!(cmd.gear, MAX_GEAR);
        assert_eq!(cmd.steer, -1.0);
        assert_eq!(cmd.clutch, 0.5);
    }

    #[test]
    fn test_sanitize_replaces_non_finite() {
        let cmd = ControlCommand {
            accel: f64::NAN,
            steer: f64::INFINITY,
            gear: -5,
            ..ControlCommand::default()
        }
        .sanitized();
        assert_eq!(cmd.accel, 0.0);
        assert_eq!(cmd.steer, 0.0);
        assert_eq!(cmd.gear, MIN_GEAR);
    }

    #[test]
    fn test_encode_is_sanitized() {
        let cmd = ControlCommand {
            accel: 2.0,
            ..ControlCommand::default()
        };
        assert!(cmd.encode().starts_with("(accel 1.0)"));
    }
}
