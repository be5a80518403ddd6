//! Input and output line formats for `tollgate serve`.
//!
//! Every input line is a JSON object. Lines with a `control` field are
//! trusted wallet controls from the host; anything else is treated as a page
//! message and decoded with [`InboundMessage::decode`].

use serde::{Deserialize, Serialize};
use tollgate_approval::{InboundMessage, Origin, OutboundMessage, ProviderRequest, Target};

/// A wallet control issued by the host, never by a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "control", rename_all = "kebab-case")]
pub(crate) enum Control {
    /// The user approved `origin` in the popup.
    Approve { origin: Origin },
    /// The user rejected `origin` in the popup.
    Reject { origin: Origin },
    /// The wallet session locked.
    Lock,
    /// The wallet session unlocked.
    Unlock,
    /// The user toggled privacy mode.
    SetPrivacy { enabled: bool },
    /// Forget approvals without a lock broadcast.
    Clear,
    /// Emit the current pending list.
    Pending,
}

/// One decoded input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputLine {
    Control(Control),
    Page(InboundMessage),
}

/// Why an input line was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Skipped {
    /// The line was blank.
    Blank,
    /// The line was not a known control or page message.
    Invalid(String),
}

/// Decode one line of input.
pub(crate) fn parse_line(line: &str) -> Result<InputLine, Skipped> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Skipped::Blank);
    }
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| Skipped::Invalid(e.to_string()))?;

    if value.get("control").is_some() {
        return serde_json::from_value(value)
            .map(InputLine::Control)
            .map_err(|e| Skipped::Invalid(e.to_string()));
    }
    InboundMessage::decode(value)
        .map(InputLine::Page)
        .map_err(|e| Skipped::Invalid(e.to_string()))
}

/// One line of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub(crate) enum OutputLine {
    /// A message for page contexts.
    Message {
        target: Target,
        message: OutboundMessage,
    },
    /// The approval popup opened or closed.
    Popup { open: bool },
    /// Public wallet state should be re-published.
    PublicStateChanged,
    /// The pending-request list.
    Pending { requests: Vec<ProviderRequest> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_controls() {
        assert_eq!(
            parse_line(r#"{"control":"approve","origin":"https://a.test"}"#).unwrap(),
            InputLine::Control(Control::Approve {
                origin: Origin::from("https://a.test")
            })
        );
        assert_eq!(
            parse_line(r#"{"control":"set-privacy","enabled":false}"#).unwrap(),
            InputLine::Control(Control::SetPrivacy { enabled: false })
        );
        assert_eq!(
            parse_line(r#" {"control":"lock"} "#).unwrap(),
            InputLine::Control(Control::Lock)
        );
    }

    #[test]
    fn test_parse_page_message() {
        assert_eq!(
            parse_line(r#"{"action":"init-is-unlocked"}"#).unwrap(),
            InputLine::Page(InboundMessage::IsUnlockedQuery)
        );
    }

    #[test]
    fn test_control_field_wins_over_action() {
        let parsed = parse_line(r#"{"control":"clear","action":"provider-request"}"#).unwrap();
        assert_eq!(parsed, InputLine::Control(Control::Clear));
    }

    #[test]
    fn test_skipped_lines() {
        assert_eq!(parse_line("   "), Err(Skipped::Blank));
        assert!(matches!(parse_line("not json"), Err(Skipped::Invalid(_))));
        assert!(matches!(
            parse_line(r#"{"control":"explode"}"#),
            Err(Skipped::Invalid(_))
        ));
        assert!(matches!(
            parse_line(r#"{"action":"approve-provider-request","origin":"o"}"#),
            Err(Skipped::Invalid(_))
        ));
    }

    #[test]
    fn test_output_line_shapes() {
        let line = OutputLine::Message {
            target: Target::All,
            message: OutboundMessage::WalletLocked,
        };
        assert_eq!(
            serde_json::to_value(line).unwrap(),
            json!({"kind": "message", "target": "all", "message": {"action": "wallet-locked"}})
        );
        assert_eq!(
            serde_json::to_value(OutputLine::Popup { open: true }).unwrap(),
            json!({"kind": "popup", "open": true})
        );
        assert_eq!(
            serde_json::to_value(OutputLine::PublicStateChanged).unwrap(),
            json!({"kind": "public-state-changed"})
        );
    }
}
