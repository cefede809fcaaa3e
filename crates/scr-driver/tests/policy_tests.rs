//! Policy behaviour over several cycles.

use std::time::{Duration, Instant};

use scr_driver::{
    CarryState, ControlPolicy, GearStrategy, InputEvent, InputSymbol, PolicyFactory, PolicyKind,
    RuleBasedConfig, TeardownReason, input_channel,
};
use scr_telemetry::SensorSnapshot;

fn frame(text: &str) -> SensorSnapshot {
    SensorSnapshot::from_message(text)
}

fn drive(policy: &mut ControlPolicy, frames: &[&str]) -> CarryState {
    frames.iter().fold(CarryState::new(), |carry, text| {
        policy.decide(&frame(text), carry).carry
    })
}

#[test]
fn test_rule_based_accelerates_from_standstill() {
    let mut policy = PolicyFactory::rule_based(RuleBasedConfig::default()).build();
    let frames = ["(gear 0)(rpm 900)(speedX 0)(angle 0)(trackPos 0)"; 5];
    let carry = drive(&mut policy, &frames);
    // throttle ramps 0.1 per cycle, and first gear engages once it passes 0.1
    assert!((carry.command.accel - 0.5).abs() < 1e-9);
    assert_eq!(carry.command.gear, 1);
}

#[test]
fn test_fresh_carry_forgets_rpm_trend() {
    let mut policy = PolicyFactory::rule_based(RuleBasedConfig::default()).build();
    let carry = drive(&mut policy, &["(gear 3)(rpm 6900)(speedX 120)"]);
    assert_eq!(carry.prev_rpm, Some(6900.0));

    // a new episode starts from a fresh carry-state: no trend, no upshift
    let d = policy.decide(&frame("(gear 3)(rpm 7001)(speedX 120)"), CarryState::new());
    assert_eq!(d.command.gear, 3);
    let d = policy.decide(&frame("(gear 3)(rpm 7001)(speedX 120)"), carry);
    assert_eq!(d.command.gear, 4);
}

#[test]
fn test_extended_strategy_from_config() {
    let config = RuleBasedConfig {
        gear_strategy: GearStrategy::Extended,
        ..RuleBasedConfig::default()
    };
    let mut policy = PolicyFactory::rule_based(config).build();
    let carry = drive(&mut policy, &["(gear 2)(rpm 8100)(speedX 90)"]);
    assert_eq!(carry.command.gear, 3);
}

#[test]
fn test_manual_capture_over_episode_restart() {
    let (tx, rx) = input_channel();
    let factory = PolicyFactory::manual_capture(rx);
    let mut policy = factory.build();
    assert_eq!(policy.kind(), PolicyKind::ManualCapture);

    let t0 = Instant::now();
    assert!(tx.send(InputEvent::press_at(InputSymbol::GearUp, t0)));
    assert!(tx.send(InputEvent::press_at(InputSymbol::Accelerate, t0)));
    let d = policy.decide(&SensorSnapshot::unavailable(), CarryState::new());
    assert_eq!(d.command.gear, 2);
    assert_eq!(d.command.accel, 1.0);

    assert!(tx.send(InputEvent::press_at(
        InputSymbol::GearUp,
        t0 + Duration::from_millis(300)
    )));
    policy.teardown(TeardownReason::Restart);

    let mut policy = factory.build();
    let d = policy.decide(&SensorSnapshot::unavailable(), CarryState::new());
    assert_eq!(d.command.gear, 1);
    assert_eq!(d.command.accel, 0.0);
    assert!(tx.is_active());

    policy.teardown(TeardownReason::Shutdown);
    assert!(!tx.is_active());
}
