//! Wire format for chat payloads: `"[<sender_id>] <display_name>: <body>"`.
//!
//! No escaping is performed; a sender id containing `]` degrades attribution
//! but never makes decoding fail. Malformed payloads decode to an empty
//! sender id so they still get displayed as coming from an unknown sender.

use crate::common::ChatMessage;

/// Build the payload published on the chat topic.
pub fn encode(sender_id: &str, display_name: &str, body: &str) -> String {
    format!("[{sender_id}] {display_name}: {body}")
}

/// Parse a payload received from the chat topic. Never fails.
///
/// The sender id is the substring between the first `[` and the first `]`
/// after it. The remainder past `"] "` splits once on `": "` into display
/// name and body; without that separator the whole remainder is the body.
pub fn decode(payload: &str) -> ChatMessage {
    let sender_id = payload
        .find('[')
        .and_then(|open| {
            let rest = &payload[open + 1..];
            rest.find(']').map(|close| &rest[..close])
        })
        .unwrap_or("");

    let remainder = payload
        .split_once("] ")
        .map_or(payload, |(_, rest)| rest);

    let (display_name, body) = match remainder.split_once(": ") {
        Some((name, body)) => (name, body),
        None => ("", remainder),
    };

    ChatMessage {
        sender_id: sender_id.to_string(),
        display_name: display_name.to_string(),
        body: body.to_string(),
    }
}
