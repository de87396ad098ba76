use axum::response::sse::Event;
use events::Message;

/// Converts a relayed message into a single SSE frame (`data: <message>\n\n`).
pub trait ToSseEvent {
    fn to_sse_event(&self) -> Event;
}

impl ToSseEvent for Message {
    fn to_sse_event(&self) -> Event {
        Event::default().data(normalize_line_endings(&self.as_text()))
    }
}

/// SSE fields may not contain a carriage return. Multi-line payloads are sent
/// as several `data:` lines, which clients join back with `\n`.
pub(crate) fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings_strips_carriage_returns() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
        assert_eq!(normalize_line_endings("plain"), "plain");
    }

    #[test]
    fn test_crlf_payload_converts_without_panicking() {
        let _event = Message::from("line one\r\nline two").to_sse_event();
    }
}
