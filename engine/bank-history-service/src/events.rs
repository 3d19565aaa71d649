//! Game events that drive captures and panel state
//!
//! Events arrive as JSON lines, e.g.
//! `{"event":"bank_opened","account":"alice","total_value":1200000}`.

use anyhow::{Context, Result};
use history_store::Breakdown;
use serde::{Deserialize, Serialize};

/// An event observed in the game client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The bank interface finished loading
    BankOpened {
        account: String,

        /// Valuation of the bank contents, when one could be computed
        #[serde(default)]
        total_value: Option<i64>,

        #[serde(default)]
        breakdown: Option<Breakdown>,
    },

    /// The bank interface was hidden
    BankClosed,

    /// The connection to the game server was lost
    ConnectionLost,
}

impl GameEvent {
    /// Parse one input line; blank lines and `#` comments yield `None`
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let event = serde_json::from_str(line)
            .with_context(|| format!("Invalid game event: {line}"))?;
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use history_store::ItemValuation;

    #[test]
    fn test_parse_bank_opened() {
        let event = GameEvent::parse_line(
            r#"{"event":"bank_opened","account":"alice","total_value":1000,"breakdown":{"coins":{"quantity":1000,"value":1000}}}"#,
        )
        .unwrap()
        .unwrap();

        let mut breakdown = Breakdown::new();
        breakdown.insert("coins".to_string(), ItemValuation { quantity: 1000, value: 1000 });
        assert_eq!(
            event,
            GameEvent::BankOpened {
                account: "alice".to_string(),
                total_value: Some(1000),
                breakdown: Some(breakdown),
            }
        );
    }

    #[test]
    fn test_parse_without_valuation() {
        let event =
            GameEvent::parse_line(r#"{"event":"bank_opened","account":"alice"}"#).unwrap().unwrap();
        assert!(matches!(event, GameEvent::BankOpened { total_value: None, .. }));
    }

    #[test]
    fn test_parse_unit_events_and_skips() {
        assert_eq!(
            GameEvent::parse_line(r#"{"event":"bank_closed"}"#).unwrap(),
            Some(GameEvent::BankClosed)
        );
        assert_eq!(
            GameEvent::parse_line(r#" {"event":"connection_lost"} "#).unwrap(),
            Some(GameEvent::ConnectionLost)
        );
        assert_eq!(GameEvent::parse_line("   ").unwrap(), None);
        assert_eq!(GameEvent::parse_line("# comment").unwrap(), None);
        assert!(GameEvent::parse_line(r#"{"event":"teleported"}"#).is_err());
    }
}
