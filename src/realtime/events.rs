//! Wire formats for the chat socket: server-pushed events and the inbound
//! send frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event pushed to a client over its WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    PersonalMessage {
        sender_id: i64,
        sender_name: String,
        content: String,
        timestamp: DateTime<Utc>,
    },
    GroupMessage {
        group_id: i64,
        group_name: String,
        sender_id: i64,
        sender_name: String,
        content: String,
        timestamp: DateTime<Utc>,
    },
    Notification {
        content: String,
        timestamp: DateTime<Utc>,
    },
    /// Sent once, at connect, on the notification stream only.
    UnreadCount { count: i64 },
}

impl OutboundEvent {
    /// Serialize to the JSON text frame pushed over the socket.
    pub fn to_frame(&self) -> String {
        // Serialization of these variants cannot fail.
        serde_json::to_string(self).unwrap()
    }
}

/// One inbound chat send. Decoding is deliberately permissive: a missing
/// `type` means `personal`, and fields the variant does not need are
/// ignored. Frames that do not resolve to a route are silently dropped.
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: String,
    pub recipient_id: Option<i64>,
    pub group_id: Option<i64>,
}

/// Where a decoded frame should be dispatched.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameRoute {
    Personal(i64),
    Group(i64),
}

impl InboundFrame {
    /// Resolve the frame's addressing, or `None` if it is semantically
    /// incomplete (personal without recipient, group without group id, or an
    /// unrecognized type).
    pub fn route(&self) -> Option<FrameRoute> {
        match self.kind.as_deref().unwrap_or("personal") {
            "personal" => self.recipient_id.map(FrameRoute::Personal),
            "group" => self.group_id.map(FrameRoute::Group),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn personal_message_event_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = OutboundEvent::PersonalMessage {
            sender_id: 1,
            sender_name: "alice".to_string(),
            content: "hi".to_string(),
            timestamp: ts,
        };
        let value: serde_json::Value = serde_json::from_str(&event.to_frame()).unwrap();
        assert_eq!(value["type"], "personal_message");
        assert_eq!(value["sender_id"], 1);
        assert_eq!(value["sender_name"], "alice");
        assert_eq!(value["content"], "hi");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn group_message_event_shape() {
        let event = OutboundEvent::GroupMessage {
            group_id: 9,
            group_name: "dev".to_string(),
            sender_id: 2,
            sender_name: "bob".to_string(),
            content: "hello".to_string(),
            timestamp: Utc::now(),
        };
        let value: serde_json::Value = serde_json::from_str(&event.to_frame()).unwrap();
        assert_eq!(value["type"], "group_message");
        assert_eq!(value["group_id"], 9);
        assert_eq!(value["group_name"], "dev");
        assert_eq!(value["sender_id"], 2);
    }

    #[test]
    fn unread_count_event_shape() {
        let value: serde_json::Value =
            serde_json::from_str(&OutboundEvent::UnreadCount { count: 3 }.to_frame()).unwrap();
        assert_eq!(value["type"], "unread_count");
        assert_eq!(value["count"], 3);
    }

    #[test]
    fn missing_type_defaults_to_personal() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"content":"hi","recipient_id":5}"#).unwrap();
        assert_eq!(frame.route(), Some(FrameRoute::Personal(5)));
        assert_eq!(frame.content, "hi");
    }

    #[test]
    fn incomplete_frames_resolve_to_no_route() {
        let no_recipient: InboundFrame =
            serde_json::from_str(r#"{"type":"personal","content":"hi"}"#).unwrap();
        assert_eq!(no_recipient.route(), None);

        let no_group: InboundFrame =
            serde_json::from_str(r#"{"type":"group","content":"hi"}"#).unwrap();
        assert_eq!(no_group.route(), None);

        let unknown: InboundFrame =
            serde_json::from_str(r#"{"type":"broadcast","content":"hi","recipient_id":1}"#)
                .unwrap();
        assert_eq!(unknown.route(), None);
    }

    #[test]
    fn group_frame_routes_by_group_id() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"type":"group","content":"x","group_id":12}"#).unwrap();
        assert_eq!(frame.route(), Some(FrameRoute::Group(12)));
    }

    #[test]
    fn missing_content_defaults_to_empty() {
        let frame: InboundFrame = serde_json::from_str(r#"{"recipient_id":1}"#).unwrap();
        assert_eq!(frame.content, "");
        assert_eq!(frame.route(), Some(FrameRoute::Personal(1)));
    }
}
