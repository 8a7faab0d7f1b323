//! Behavioural modes that overlay the persona system prompt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named behavioural overlay applied to the system prompt.
///
/// The set is closed: anything outside it is rejected at the protocol
/// boundary before it can reach a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Normal,
    Caregiver,
    Focus,
    ChaosGremlin,
}

impl Mode {
    /// Every mode, in declaration order.
    pub const ALL: [Mode; 4] = [
        Mode::Normal,
        Mode::Caregiver,
        Mode::Focus,
        Mode::ChaosGremlin,
    ];

    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Caregiver => "caregiver",
            Mode::Focus => "focus",
            Mode::ChaosGremlin => "chaos_gremlin",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Mode::Normal),
            "caregiver" => Ok(Mode::Caregiver),
            "focus" => Ok(Mode::Focus),
            "chaos_gremlin" => Ok(Mode::ChaosGremlin),
            other => Err(format!("invalid mode: '{other}'")),
        }
    }
}
