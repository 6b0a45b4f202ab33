//! Delimiter framing for text messages.
//!
//! Outbound messages get the delimiter appended. Inbound payloads are split on
//! it; interior empty segments are kept, trailing empty segments are dropped,
//! and a trailing fragment without a delimiter is delivered as a message of
//! its own. Fragments are not carried over to the next read.
//!
//! # Examples
//!
//! ```
//! use chat_reactor::codec::{frame, split_messages};
//!
//! assert_eq!(frame("hello", "\n"), "hello\n");
//! assert_eq!(split_messages(b"a\nb\n", "\n"), vec!["a", "b"]);
//! assert_eq!(split_messages(b"a\nb", "\n"), vec!["a", "b"]);
//! assert!(split_messages(b"", "\n").is_empty());
//! ```

/// Appends `delimiter` to `message`.
pub fn frame(message: &str, delimiter: &str) -> String {
    let mut framed = String::with_capacity(message.len() + delimiter.len());
    framed.push_str(message);
    framed.push_str(delimiter);

    framed
}

/// Splits one read's worth of bytes into messages, in payload order.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn split_messages(payload: &[u8], delimiter: &str) -> Vec<String> {
    if payload.is_empty() {
        return Vec::new();
    }

    let text = String::from_utf8_lossy(payload);
    if delimiter.is_empty() {
        return vec![text.into_owned()];
    }

    let mut segments: Vec<&str> = text.split(delimiter).collect();
    while segments.last().is_some_and(|segment| segment.is_empty()) {
        segments.pop();
    }

    segments.into_iter().map(str::to_owned).collect()
}
