//! Session settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Race stage the server is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RaceStage {
    WarmUp,
    Qualifying,
    Race,
    #[default]
    Unknown,
}

impl RaceStage {
    /// Numeric stage code used by the server tooling (0..=3).
    pub fn code(self) -> u8 {
        match self {
            RaceStage::WarmUp => 0,
            RaceStage::Qualifying => 1,
            RaceStage::Race => 2,
            RaceStage::Unknown => 3,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => RaceStage::WarmUp,
            1 => RaceStage::Qualifying,
            2 => RaceStage::Race,
            _ => RaceStage::Unknown,
        }
    }
}

impl fmt::Display for RaceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RaceStage::WarmUp => "warm-up",
            RaceStage::Qualifying => "qualifying",
            RaceStage::Race => "race",
            RaceStage::Unknown => "unknown",
        })
    }
}

impl FromStr for RaceStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warm-up" | "warmup" | "0" => Ok(RaceStage::WarmUp),
            "qualifying" | "1" => Ok(RaceStage::Qualifying),
            "race" | "2" => Ok(RaceStage::Race),
            "unknown" | "3" => Ok(RaceStage::Unknown),
            other => Err(format!("unknown race stage: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Prefix of the identification message.
    pub bot_id: String,
    /// Cycles per episode; 0 means no limit.
    pub max_steps: u64,
    /// Episodes before the session ends; 0 means no limit.
    pub max_episodes: u32,
    pub receive_buffer_bytes: usize,
    pub stage: RaceStage,
    pub track: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bot_id: "SCR".to_string(),
            max_steps: 0,
            max_episodes: 1,
            receive_buffer_bytes: 1000,
            stage: RaceStage::Unknown,
            track: None,
        }
    }
}
