//! Track-edge rangefinder geometry.

use scr_codec::OutboundMessage;

use crate::schema::TRACK_SENSORS;

/// Angular offsets (degrees) of the track rangefinders, declared at
/// identification. Index `i` here is `track[i]` in every sensor message.
pub const RANGEFINDER_ANGLES: [f64; TRACK_SENSORS] = [
    -90.0, -75.0, -60.0, -45.0, -30.0, -20.0, -15.0, -10.0, -5.0, 0.0, 5.0, 10.0, 15.0, 20.0,
    30.0, 45.0, 60.0, 75.0, 90.0,
];

/// Identification payload: the bot id immediately followed by the `init`
/// group listing the rangefinder angles.
pub fn identification_message(bot_id: &str) -> String {
    let init = OutboundMessage::new().with_values("init", RANGEFINDER_ANGLES);
    format!("{bot_id}{}", init.encode())
}
