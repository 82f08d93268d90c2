//! Agent operating modes.
//!
//! The mode only affects the system prompt: each mode appends a focus
//! addendum to the base prompt. Switching modes never touches history.

use serde::{Deserialize, Serialize};

/// The agent's current operating focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// General security assistant
    #[default]
    Base,
    /// Offensive assessment support
    RedTeam,
    /// Defensive monitoring and hardening
    BlueTeam,
    /// Local machine security review
    DesktopSecurity,
    /// Web application testing
    WebPentest,
    /// Open-source intelligence gathering
    Osint,
    /// Smart contract review
    SmartContract,
}

impl AgentMode {
    /// All modes, in display order.
    pub const ALL: [AgentMode; 7] = [
        AgentMode::Base,
        AgentMode::RedTeam,
        AgentMode::BlueTeam,
        AgentMode::DesktopSecurity,
        AgentMode::WebPentest,
        AgentMode::Osint,
        AgentMode::SmartContract,
    ];

    /// The stable key used in config, CLI flags, and the prompt table.
    pub fn key(&self) -> &'static str {
        match self {
            AgentMode::Base => "base",
            AgentMode::RedTeam => "redteam",
            AgentMode::BlueTeam => "blueteam",
            AgentMode::DesktopSecurity => "desktopsecurity",
            AgentMode::WebPentest => "webpentest",
            AgentMode::Osint => "osint",
            AgentMode::SmartContract => "smartcontract",
        }
    }
}

impl std::fmt::Display for AgentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(AgentMode::Base),
            "redteam" => Ok(AgentMode::RedTeam),
            "blueteam" => Ok(AgentMode::BlueTeam),
            "desktopsecurity" => Ok(AgentMode::DesktopSecurity),
            "webpentest" => Ok(AgentMode::WebPentest),
            "osint" => Ok(AgentMode::Osint),
            "smartcontract" => Ok(AgentMode::SmartContract),
            other => Err(format!(
                "Invalid mode '{other}'. Valid modes: base, redteam, blueteam, desktopsecurity, webpentest, osint, smartcontract"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parse_all_keys() {
        for mode in AgentMode::ALL {
            assert_eq!(AgentMode::from_str(mode.key()).unwrap(), mode);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(AgentMode::from_str("RedTeam").unwrap(), AgentMode::RedTeam);
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let err = AgentMode::from_str("purple").unwrap_err();
        assert!(err.contains("purple"));
    }

    #[test]
    fn default_mode_is_base() {
        assert_eq!(AgentMode::default(), AgentMode::Base);
    }
}
