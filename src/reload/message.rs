//! Wire messages.
//!
//! Two JSON messages share the `{"event_type": ..., "data": ...}` shape:
//!
//! - [`ChangeMessage`]: producer -> reload listener, `data` is the list of
//!   changed template paths (relative to the project root)
//! - [`LiveMessage`]: server -> browser, `data` maps element ids to markup
//!
//! Unknown `event_type` values are ignored by both receivers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rebuild::RenderedViews;

/// The only event type either side acts on.
pub const UPDATE_VIEWS: &str = "update_views";

/// Change notification sent over the reload socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data", rename_all = "snake_case")]
pub enum ChangeMessage {
    UpdateViews(Vec<String>),
}

impl ChangeMessage {
    pub fn update_views<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Self {
        Self::UpdateViews(paths.into_iter().map(Into::into).collect())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"event_type":"{UPDATE_VIEWS}","data":[]}}"#))
    }

    /// Parse a received notification.
    ///
    /// `Ok(None)` means a well-formed message with an event type this side
    /// does not handle.
    pub fn parse(bytes: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        match value.get("event_type").and_then(Value::as_str) {
            Some(UPDATE_VIEWS) => serde_json::from_value(value).map(Some),
            _ => Ok(None),
        }
    }
}

/// Live update pushed to browser clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data", rename_all = "snake_case")]
pub enum LiveMessage {
    UpdateViews(RenderedViews),
}

impl LiveMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"event_type":"{UPDATE_VIEWS}","data":{{}}}}"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_message_format() {
        let msg = ChangeMessage::update_views(["templates/views.toml"]);
        assert_eq!(
            msg.to_json(),
            r#"{"event_type":"update_views","data":["templates/views.toml"]}"#
        );
    }

    #[test]
    fn test_parse_change_message() {
        let parsed =
            ChangeMessage::parse(br#"{"event_type":"update_views","data":["a.toml","b.toml"]}"#)
                .unwrap();
        assert_eq!(parsed, Some(ChangeMessage::update_views(["a.toml", "b.toml"])));
    }

    #[test]
    fn test_unknown_event_type_is_ignored() {
        assert_eq!(
            ChangeMessage::parse(br#"{"event_type":"restart","data":{"x":1}}"#).unwrap(),
            None
        );
        assert_eq!(ChangeMessage::parse(br#"[1, 2]"#).unwrap(), None);
    }

    #[test]
    fn test_malformed_change_message() {
        assert!(ChangeMessage::parse(b"{\"event_type\":").is_err());
        assert!(ChangeMessage::parse(br#"{"event_type":"update_views","data":7}"#).is_err());
    }

    #[test]
    fn test_live_message_format() {
        let mut views = RenderedViews::new();
        views.insert("greeting".into(), "<p>Hi</p>".into());
        assert_eq!(
            LiveMessage::UpdateViews(views).to_json(),
            r#"{"event_type":"update_views","data":{"greeting":"<p>Hi</p>"}}"#
        );
    }
}
