//! Automatic gear selection.

use scr_telemetry::{MAX_GEAR, MIN_GEAR, NEUTRAL_GEAR};
use serde::{Deserialize, Serialize};

const SIMPLE_UPSHIFT_RPM: f64 = 7000.0;
const SIMPLE_DOWNSHIFT_RPM: f64 = 3000.0;
const EXTENDED_UPSHIFT_RPM: f64 = 8000.0;
const EXTENDED_DOWNSHIFT_RPM: f64 = 2500.0;

/// Inputs of one shift decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearInputs {
    /// Baseline gear: server-reported, else the previous command's.
    pub gear: i32,
    pub rpm: f64,
    /// Longitudinal speed (km/h).
    pub speed: f64,
    pub accel: f64,
    pub brake: f64,
    pub prev_rpm: Option<f64>,
}

/// Shift rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GearStrategy {
    /// Forward gears and neutral only, upshift gated on rising rpm.
    #[default]
    Simple,
    /// Adds reverse engagement when braking at standstill.
    Extended,
}

impl GearStrategy {
    pub fn select(self, inputs: GearInputs) -> i32 {
        match self {
            GearStrategy::Simple => simple_gear(inputs),
            GearStrategy::Extended => extended_gear(inputs),
        }
    }

    /// Force a gear into the range this strategy can emit.
    pub fn clamp(self, gear: i32) -> i32 {
        match self {
            GearStrategy::Simple => gear.clamp(NEUTRAL_GEAR, MAX_GEAR),
            GearStrategy::Extended => clamp_extended(gear),
        }
    }
}

fn simple_gear(inputs: GearInputs) -> i32 {
    let GearInputs {
        mut gear,
        rpm,
        speed,
        accel,
        prev_rpm,
        ..
    } = inputs;
    let rising = prev_rpm.is_some_and(|prev| rpm > prev);

    if gear == NEUTRAL_GEAR && speed < 10.0 && accel > 0.1 {
        gear = 1;
    } else if rising && rpm > SIMPLE_UPSHIFT_RPM && (1..MAX_GEAR).contains(&gear) {
        gear += 1;
    } else if !rising && rpm < SIMPLE_DOWNSHIFT_RPM && gear > 1 {
        gear -= 1;
    } else if speed < 1.0 && accel <= 0.1 && gear > NEUTRAL_GEAR {
        gear = NEUTRAL_GEAR;
    }

    gear.clamp(NEUTRAL_GEAR, MAX_GEAR)
}

fn extended_gear(inputs: GearInputs) -> i32 {
    let GearInputs {
        mut gear,
        rpm,
        speed,
        accel,
        brake,
        ..
    } = inputs;

    if gear == NEUTRAL_GEAR && speed < 5.0 && accel > 0.2 {
        gear = 1;
    } else if brake > 0.8 && speed < 1.0 && gear >= NEUTRAL_GEAR {
        if speed < -0.5 {
            gear = MIN_GEAR;
        } else if gear > NEUTRAL_GEAR {
            gear = NEUTRAL_GEAR;
        }
    } else if rpm > EXTENDED_UPSHIFT_RPM && (1..MAX_GEAR).contains(&gear) {
        gear += 1;
    } else if rpm < EXTENDED_DOWNSHIFT_RPM && gear > 1 {
        gear -= 1;
    }

    if speed < 2.0 && gear > NEUTRAL_GEAR && accel < 0.1 {
        gear = NEUTRAL_GEAR;
    }

    clamp_extended(gear)
}

fn clamp_extended(gear: i32) -> i32 {
    match gear {
        g if g >= 1 => g.min(MAX_GEAR),
        NEUTRAL_GEAR => NEUTRAL_GEAR,
        _ => MIN_GEAR,
    }
}
