//! Builder for server sensor messages.

use scr_codec::{OutboundMessage, Token};
use scr_telemetry::tags;

/// Builds the text of a server sensor frame.
///
/// ```rust
/// use scr_test_helpers::SensorFrameBuilder;
///
/// let frame = SensorFrameBuilder::new().speed(42.0).rpm(5000.0).gear(3).build();
/// assert_eq!(frame, "(speedX 42.0)(rpm 5000.0)(gear 3)");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SensorFrameBuilder {
    message: OutboundMessage,
}

impl SensorFrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stationary car on the track axis, the server's usual first frame.
    pub fn standing_start() -> Self {
        Self::new()
            .angle(0.0)
            .track_pos(0.0)
            .speed(0.0)
            .rpm(942.0)
            .gear(0)
    }

    pub fn scalar(mut self, tag: &str, value: f64) -> Self {
        self.message.push(tag, vec![Some(Token::from(value))]);
        self
    }

    pub fn values<I: IntoIterator<Item = f64>>(mut self, tag: &str, values: I) -> Self {
        self.message
            .push(tag, values.into_iter().map(|v| Some(Token::from(v))).collect());
        self
    }

    /// Raw token, for malformed values.
    pub fn raw(mut self, tag: &str, token: &str) -> Self {
        self.message.push(tag, vec![Some(Token::from(token))]);
        self
    }

    pub fn speed(self, value: f64) -> Self {
        self.scalar(tags::SPEED_X, value)
    }

    pub fn rpm(self, value: f64) -> Self {
        self.scalar(tags::RPM, value)
    }

    pub fn angle(self, value: f64) -> Self {
        self.scalar(tags::ANGLE, value)
    }

    pub fn track_pos(self, value: f64) -> Self {
        self.scalar(tags::TRACK_POS, value)
    }

    pub fn gear(mut self, value: i32) -> Self {
        self.message.push(tags::GEAR, vec![Some(Token::from(value))]);
        self
    }

    pub fn track(self, distances: [f64; 19]) -> Self {
        self.values(tags::TRACK, distances)
    }

    pub fn build(&self) -> String {
        self.message.encode()
    }
}

impl From<SensorFrameBuilder> for String {
    fn from(builder: SensorFrameBuilder) -> Self {
        builder.build()
    }
}
