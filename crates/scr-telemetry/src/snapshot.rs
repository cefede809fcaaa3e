//! Decoded sensor state of a single protocol cycle.

use std::fmt;

use scr_codec::{OutboundMessage, TagMap, Token};
use tracing::warn;

use crate::schema::{FOCUS_SENSORS, OPPONENT_SENSORS, TRACK_SENSORS, WHEEL_SENSORS};

/// Inbound tag names.
pub mod tags {
    pub const ANGLE: &str = "angle";
    pub const CUR_LAP_TIME: &str = "curLapTime";
    pub const DAMAGE: &str = "damage";
    pub const DIST_FROM_START: &str = "distFromStart";
    pub const DIST_RACED: &str = "distRaced";
    pub const FOCUS: &str = "focus";
    pub const FUEL: &str = "fuel";
    pub const GEAR: &str = "gear";
    pub const LAST_LAP_TIME: &str = "lastLapTime";
    pub const OPPONENTS: &str = "opponents";
    pub const RACE_POS: &str = "racePos";
    pub const RPM: &str = "rpm";
    pub const SPEED_X: &str = "speedX";
    pub const SPEED_Y: &str = "speedY";
    pub const SPEED_Z: &str = "speedZ";
    pub const TRACK: &str = "track";
    pub const TRACK_POS: &str = "trackPos";
    pub const WHEEL_SPIN_VEL: &str = "wheelSpinVel";
    pub const Z: &str = "z";
}

/// Fixed-arity sensor vector; each element is independently present or absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorArray<const N: usize> {
    values: [Option<f64>; N],
}

impl<const N: usize> Default for SensorArray<N> {
    fn default() -> Self {
        Self { values: [None; N] }
    }
}

impl<const N: usize> SensorArray<N> {
    pub const LEN: usize = N;

    pub const fn new(values: [Option<f64>; N]) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn as_slice(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values.iter().copied()
    }

    pub fn present_count(&self) -> usize {
        self.values.iter().flatten().count()
    }
}

/// Why a token could not become a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionFailure {
    NotANumber,
    NotFinite,
    NotAnInteger,
    /// More tokens than the field's fixed arity.
    Surplus,
}

/// Field-local conversion problem. The affected value is left absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiagnostic {
    pub tag: &'static str,
    pub index: Option<usize>,
    pub token: String,
    pub failure: ConversionFailure,
}

impl fmt::Display for FieldDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(
                f,
                "{}[{index}]: cannot use {:?} ({:?})",
                self.tag, self.token, self.failure
            ),
            None => write!(
                f,
                "{}: cannot use {:?} ({:?})",
                self.tag, self.token, self.failure
            ),
        }
    }
}

/// Sensor state decoded from one server message.
///
/// Every field is absent until its token converts cleanly. A snapshot is
/// rebuilt from scratch each cycle and never merged with the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Angle between car direction and track axis (rad).
    pub angle: Option<f64>,
    pub cur_lap_time: Option<f64>,
    pub damage: Option<f64>,
    pub dist_from_start: Option<f64>,
    pub dist_raced: Option<f64>,
    pub fuel: Option<f64>,
    /// Gear reported by the server (-1 reverse, 0 neutral).
    pub gear: Option<i32>,
    pub last_lap_time: Option<f64>,
    pub race_pos: Option<i32>,
    pub rpm: Option<f64>,
    /// Longitudinal speed (km/h).
    pub speed_x: Option<f64>,
    pub speed_y: Option<f64>,
    pub speed_z: Option<f64>,
    /// Lateral position: 0 on the axis, ±1 on the edges.
    pub track_pos: Option<f64>,
    /// Altitude above the track surface.
    pub z: Option<f64>,
    pub focus: SensorArray<FOCUS_SENSORS>,
    pub track: SensorArray<TRACK_SENSORS>,
    pub opponents: SensorArray<OPPONENT_SENSORS>,
    pub wheel_spin_vel: SensorArray<WHEEL_SENSORS>,
    available: bool,
    diagnostics: Vec<FieldDiagnostic>,
}

impl SensorSnapshot {
    /// Snapshot for a cycle with no usable sensor data.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Decode a raw server message. A structurally corrupt message yields
    /// [`SensorSnapshot::unavailable`].
    pub fn from_message(text: &str) -> Self {
        match scr_codec::decode(text) {
            Ok(tags) => Self::from_decoded(&tags),
            Err(e) => {
                warn!(error = %e, "discarding corrupt sensor message");
                Self::unavailable()
            }
        }
    }

    /// Build a snapshot from decoded groups, converting every field on its own.
    pub fn from_decoded(decoded: &TagMap) -> Self {
        let mut reader = FieldReader {
            decoded,
            diagnostics: Vec::new(),
        };

        Self {
            angle: reader.float(tags::ANGLE),
            cur_lap_time: reader.float(tags::CUR_LAP_TIME),
            damage: reader.float(tags::DAMAGE),
            dist_from_start: reader.float(tags::DIST_FROM_START),
            dist_raced: reader.float(tags::DIST_RACED),
            fuel: reader.float(tags::FUEL),
            gear: reader.integer(tags::GEAR),
            last_lap_time: reader.float(tags::LAST_LAP_TIME),
            race_pos: reader.integer(tags::RACE_POS),
            rpm: reader.float(tags::RPM),
            speed_x: reader.float(tags::SPEED_X),
            speed_y: reader.float(tags::SPEED_Y),
            speed_z: reader.float(tags::SPEED_Z),
            track_pos: reader.float(tags::TRACK_POS),
            z: reader.float(tags::Z),
            focus: reader.array(tags::FOCUS),
            track: reader.array(tags::TRACK),
            opponents: reader.array(tags::OPPONENTS),
            wheel_spin_vel: reader.array(tags::WHEEL_SPIN_VEL),
            available: !decoded.is_empty(),
            diagnostics: reader.diagnostics,
        }
    }

    /// Whether the message carried any sensor groups at all.
    pub fn sensors_available(&self) -> bool {
        self.available
    }

    pub fn diagnostics(&self) -> &[FieldDiagnostic] {
        &self.diagnostics
    }

    /// Re-encode the present fields in server wire order.
    ///
    /// A vector is written up to its first absent element; later elements are
    /// dropped rather than moved to a different index.
    pub fn to_message(&self) -> OutboundMessage {
        let mut msg = OutboundMessage::new();
        push_scalar(&mut msg, tags::ANGLE, self.angle);
        push_scalar(&mut msg, tags::CUR_LAP_TIME, self.cur_lap_time);
        push_scalar(&mut msg, tags::DAMAGE, self.damage);
        push_scalar(&mut msg, tags::DIST_FROM_START, self.dist_from_start);
        push_scalar(&mut msg, tags::DIST_RACED, self.dist_raced);
        push_array(&mut msg, tags::FOCUS, self.focus.as_slice());
        push_scalar(&mut msg, tags::FUEL, self.fuel);
        msg.push(tags::GEAR, vec![self.gear.map(Token::from)]);
        push_scalar(&mut msg, tags::LAST_LAP_TIME, self.last_lap_time);
        push_array(&mut msg, tags::OPPONENTS, self.opponents.as_slice());
        msg.push(tags::RACE_POS, vec![self.race_pos.map(Token::from)]);
        push_scalar(&mut msg, tags::RPM, self.rpm);
        push_scalar(&mut msg, tags::SPEED_X, self.speed_x);
        push_scalar(&mut msg, tags::SPEED_Y, self.speed_y);
        push_scalar(&mut msg, tags::SPEED_Z, self.speed_z);
        push_array(&mut msg, tags::TRACK, self.track.as_slice());
        push_scalar(&mut msg, tags::TRACK_POS, self.track_pos);
        push_array(&mut msg, tags::WHEEL_SPIN_VEL, self.wheel_spin_vel.as_slice());
        push_scalar(&mut msg, tags::Z, self.z);
        msg
    }
}

fn push_scalar(msg: &mut OutboundMessage, tag: &str, value: Option<f64>) {
    msg.push(tag, vec![value.map(Token::from)]);
}

fn push_array(msg: &mut OutboundMessage, tag: &str, values: &[Option<f64>]) {
    msg.push(tag, values.iter().map(|v| v.map(Token::from)).collect());
}

struct FieldReader<'a> {
    decoded: &'a TagMap,
    diagnostics: Vec<FieldDiagnostic>,
}

impl FieldReader<'_> {
    fn first_token(&self, tag: &str) -> Option<&str> {
        self.decoded
            .get(tag)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    fn float(&mut self, tag: &'static str) -> Option<f64> {
        let token = self.first_token(tag)?;
        match parse_float(token) {
            Ok(value) => Some(value),
            Err(failure) => {
                let token = token.to_owned();
                self.reject(tag, None, token, failure);
                None
            }
        }
    }

    fn integer(&mut self, tag: &'static str) -> Option<i32> {
        let token = self.first_token(tag)?;
        match parse_integer(token) {
            Ok(value) => Some(value),
            Err(failure) => {
                let token = token.to_owned();
                self.reject(tag, None, token, failure);
                None
            }
        }
    }

    fn array<const N: usize>(&mut self, tag: &'static str) -> SensorArray<N> {
        let mut values = [None; N];
        let Some(tokens) = self.decoded.get(tag) else {
            return SensorArray::new(values);
        };

        for (index, token) in tokens.iter().enumerate() {
            match values.get_mut(index) {
                Some(slot) => match parse_float(token) {
                    Ok(value) => *slot = Some(value),
                    Err(failure) => self.reject(tag, Some(index), token.clone(), failure),
                },
                None => self.reject(tag, Some(index), token.clone(), ConversionFailure::Surplus),
            }
        }

        SensorArray::new(values)
    }

    fn reject(
        &mut self,
        tag: &'static str,
        index: Option<usize>,
        token: String,
        failure: ConversionFailure,
    ) {
        let diagnostic = FieldDiagnostic {
            tag,
            index,
            token,
            failure,
        };
        warn!(%diagnostic, "sensor field left absent");
        self.diagnostics.push(diagnostic);
    }
}

fn parse_float(token: &str) -> Result<f64, ConversionFailure> {
    let value: f64 = token.parse().map_err(|_| ConversionFailure::NotANumber)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConversionFailure::NotFinite)
    }
}

fn parse_integer(token: &str) -> Result<i32, ConversionFailure> {
    if let Ok(value) = token.parse::<i32>() {
        return Ok(value);
    }
    let value = parse_float(token)?;
    if value.fract() == 0.0 && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        #[allow(clippy::cast_possible_truncation)]
        let integral = value as i32;
        Ok(integral)
    } else {
        Err(ConversionFailure::NotAnInteger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(text: &str) -> SensorSnapshot {
        SensorSnapshot::from_message(text)
    }

    #[test]
    fn test_scalar_fields_decode() {
        let s = snapshot("(angle 0.1)(rpm 4000)(speedX 55.5)(gear 3)(racePos 2)");
        assert_eq!(s.angle, Some(0.1));
        assert_eq!(s.rpm, Some(4000.0));
        assert_eq!(s.speed_x, Some(55.5));
        assert_eq!(s.gear, Some(3));
        assert_eq!(s.race_pos, Some(2));
        assert!(s.sensors_available());
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn test_bad_scalar_token_is_absent() {
        let s = snapshot("(rpm NaNtoken)(angle 0.2)");
        assert_eq!(s.rpm, None);
        assert_eq!(s.angle, Some(0.2));
        assert!(s.sensors_available());
        assert_eq!(s.diagnostics().len(), 1);
        assert_eq!(
            s.diagnostics().first().map(|d| d.failure),
            Some(ConversionFailure::NotANumber)
        );
    }

    #[test]
    fn test_non_finite_tokens_are_rejected() {
        let s = snapshot("(rpm nan)(speedX inf)");
        assert_eq!(s.rpm, None);
        assert_eq!(s.speed_x, None);
        assert_eq!(s.diagnostics().len(), 2);
    }

    #[test]
    fn test_integer_fields_accept_integral_floats() {
        let s = snapshot("(gear 2.0)(racePos 1.5)");
        assert_eq!(s.gear, Some(2));
        assert_eq!(s.race_pos, None);
        assert_eq!(
            s.diagnostics().first().map(|d| d.failure),
            Some(ConversionFailure::NotAnInteger)
        );
    }

    #[test]
    fn test_bad_vector_element_keeps_position() {
        let s = snapshot("(wheelSpinVel 1.0 oops 3.0 4.0)");
        assert_eq!(s.wheel_spin_vel.get(0), Some(1.0));
        assert_eq!(s.wheel_spin_vel.get(1), None);
        assert_eq!(s.wheel_spin_vel.get(2), Some(3.0));
        assert_eq!(s.wheel_spin_vel.get(3), Some(4.0));
        assert_eq!(
            s.diagnostics().first().and_then(|d| d.index),
            Some(1)
        );
    }

    #[test]
    fn test_short_vector_leaves_tail_absent() {
        let s = snapshot("(track 1 2 3)");
        assert_eq!(s.track.present_count(), 3);
        assert_eq!(s.track.get(18), None);
    }

    #[test]
    fn test_surplus_vector_tokens_are_dropped() {
        let s = snapshot("(wheelSpinVel 1 2 3 4 5)");
        assert_eq!(s.wheel_spin_vel.present_count(), 4);
        assert_eq!(
            s.diagnostics().first().map(|d| d.failure),
            Some(ConversionFailure::Surplus)
        );
    }

    #[test]
    fn test_corrupt_message_is_unavailable() {
        let s = snapshot("(angle 0.1 (speedX 10)");
        assert!(!s.sensors_available());
        assert_eq!(s.angle, None);
    }

    #[test]
    fn test_message_without_groups_is_unavailable() {
        assert!(!snapshot("").sensors_available());
        assert!(!snapshot("(bad)").sensors_available());
    }

    #[test]
    fn test_to_message_round_trips_present_fields() {
        let original = snapshot("(angle -0.5)(gear 4)(rpm 6100.5)(track 1 2 3)(z 0.3)");
        let again = SensorSnapshot::from_message(&original.to_message().encode());
        assert_eq!(again, original);
    }

    #[test]
    fn test_to_message_never_shifts_vector_elements() {
        let original = snapshot("(track 1 x 3)(rpm 900)");
        assert_eq!(original.track.get(1), None);
        assert_eq!(original.track.get(2), Some(3.0));

        let wire = original.to_message().encode();
        assert!(wire.contains("(track 1.0)"));
        let again = SensorSnapshot::from_message(&wire);
        assert_eq!(again.track.get(0), Some(1.0));
        assert_eq!(again.track.get(1), None);
        assert_eq!(again.track.get(2), None);
        assert_eq!(again.rpm, Some(900.0));
    }

    #[test]
    fn test_diagnostic_display_names_field() {
        let d = FieldDiagnostic {
            tag: tags::TRACK,
            index: Some(4),
            token: "x".to_string(),
            failure: ConversionFailure::NotANumber,
        };
        assert!(d.to_string().starts_with("track[4]"));
    }
}
