//! Line-oriented manual input from stdin.
//!
//! Each line names one input symbol. A `+` prefix presses it, `-` releases
//! it, and a bare name presses it. Blank lines and `#` comments are ignored.
//!
//! ```text
//! +accelerate
//! gear-up
//! -accelerate
//! reverse
//! ```

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use scr_driver::{InputEvent, InputSender, InputSymbol};
use tracing::{debug, warn};

pub fn parse_symbol(name: &str) -> Option<InputSymbol> {
    match name.trim().to_ascii_lowercase().as_str() {
        "accelerate" | "accel" | "up" => Some(InputSymbol::Accelerate),
        "brake" | "down" => Some(InputSymbol::Brake),
        "steer-left" | "left" => Some(InputSymbol::SteerLeft),
        "steer-right" | "right" => Some(InputSymbol::SteerRight),
        "gear-up" | "shift-up" => Some(InputSymbol::GearUp),
        "gear-down" | "shift-down" => Some(InputSymbol::GearDown),
        "reverse" => Some(InputSymbol::Reverse),
        _ => None,
    }
}

/// `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<InputEvent>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (press, name) = if let Some(rest) = line.strip_prefix('+') {
        (true, rest)
    } else if let Some(rest) = line.strip_prefix('-') {
        (false, rest)
    } else {
        (true, line)
    };

    let symbol = parse_symbol(name).ok_or_else(|| format!("unknown input '{name}'"))?;
    Ok(Some(if press {
        InputEvent::press(symbol)
    } else {
        InputEvent::release(symbol)
    }))
}

/// Forward events read from `reader` until it ends or the session stops
/// listening. Returns the number of events delivered.
pub fn pump<R: BufRead>(reader: R, sender: &InputSender) -> usize {
    let mut delivered = 0;
    for line in reader.lines() {
        if !sender.is_active() {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "input source read failed");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some(event)) => {
                if sender.send(event) {
                    delivered += 1;
                }
            }
            Ok(None) => {}
            Err(reason) => warn!(%reason, "ignoring input line"),
        }
    }
    delivered
}

/// Read stdin on a background thread. The thread is detached; it exits at
/// end of input or on the first line after the session deactivates input.
pub fn spawn_stdin_source(sender: InputSender) -> io::Result<JoinHandle<usize>> {
    thread::Builder::new()
        .name("scr-input".to_string())
        .spawn(move || {
            let delivered = pump(io::stdin().lock(), &sender);
            debug!(delivered, "stdin input source finished");
            delivered
        })
}
