//! RFC 822 helpers: plain-text extraction and digest message construction

use lettre::message::{header::ContentType, Mailbox};
use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};

use crate::error::{DigestError, Result};

/// Extract the plain-text body from a raw RFC 822 message
///
/// Multipart messages yield the concatenation of every `text/plain` part in
/// document order, descending into attached messages. A single-part message
/// yields its decoded payload whatever its type. Invalid byte sequences are
/// dropped and line endings are normalized to `\n`. Returns an empty string
/// when nothing readable is found.
pub fn extract_plain_text(raw: &[u8]) -> String {
    let Some(message) = MessageParser::default().parse(raw) else {
        return String::new();
    };

    let body = match message.parts.first().map(|root| &root.body) {
        Some(PartType::Multipart(_)) => {
            let mut out = String::new();
            collect_plain_text(&message, 0, &mut out);
            out
        }
        Some(body) => single_payload(body),
        None => String::new(),
    };

    body.replace("\r\n", "\n")
}

fn collect_plain_text(message: &Message<'_>, part_id: usize, out: &mut String) {
    let Some(part) = message.parts.get(part_id) else {
        return;
    };

    match &part.body {
        PartType::Multipart(children) => {
            for &child in children {
                collect_plain_text(message, child as usize, out);
            }
        }
        PartType::Message(inner) => collect_plain_text(inner, 0, out),
        PartType::Text(text) if is_plain_text(part) => {
            out.push_str(&drop_replacement_chars(text))
        }
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) if is_plain_text(part) => {
            out.push_str(&decode_dropping_invalid(bytes))
        }
        _ => {}
    }
}

fn single_payload(body: &PartType<'_>) -> String {
    match body {
        PartType::Text(text) | PartType::Html(text) => drop_replacement_chars(text),
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) => decode_dropping_invalid(bytes),
        PartType::Message(_) | PartType::Multipart(_) => String::new(),
    }
}

/// Parts without a Content-Type default to text/plain
fn is_plain_text(part: &MessagePart<'_>) -> bool {
    match part.content_type() {
        None => true,
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case("text")
                && ct
                    .subtype()
                    .map_or(true, |sub| sub.eq_ignore_ascii_case("plain"))
        }
    }
}

/// Charset decoding is lossy; undecodable sequences surface as U+FFFD
fn drop_replacement_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}

fn decode_dropping_invalid(bytes: &[u8]) -> String {
    drop_replacement_chars(&String::from_utf8_lossy(bytes))
}

/// Build a raw plain-text RFC 822 message ready for upload
pub fn build_plain_text(from: &str, to: &str, subject: &str, body: &str) -> Result<Vec<u8>> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| DigestError::MailSend(format!("Invalid from address '{}': {}", from, e)))?;
    let to: Mailbox = to
        .parse()
        .map_err(|e| DigestError::MailSend(format!("Invalid to address '{}': {}", to, e)))?;

    let message = lettre::Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| DigestError::MailSend(format!("Failed to build email: {}", e)))?;

    Ok(message.formatted())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPART: &str = "From: alice@example.com\r\n\
To: bob@example.com\r\n\
Subject: Plans\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Please book the venue.\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Please book the venue.</p>\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
U2VuZCB0aGUgaW52aXRlcy4=\r\n\
--b1--\r\n";

    #[test]
    fn test_multipart_concatenates_plain_parts_in_order() {
        let body = extract_plain_text(MULTIPART.as_bytes());
        assert!(body.starts_with("Please book the venue."));
        assert!(body.ends_with("Send the invites."));
        assert!(!body.contains("<p>"));
    }

    #[test]
    fn test_multipart_without_plain_part_is_empty() {
        let raw = "From: a@example.com\r\n\
Content-Type: multipart/alternative; boundary=\"b\"\r\n\
\r\n\
--b\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>only html</b>\r\n\
--b--\r\n";
        assert_eq!(extract_plain_text(raw.as_bytes()), "");
    }

    #[test]
    fn test_single_part_quoted_printable() {
        let raw = "From: a@example.com\r\n\
Subject: hi\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Caf=C3=A9 at noon\r\n";
        assert_eq!(extract_plain_text(raw.as_bytes()).trim_end(), "Café at noon");
    }

    #[test]
    fn test_nested_message_plain_text_is_included() {
        let raw = "From: a@example.com\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: text/plain\r\n\
\r\n\
See forwarded.\r\n\
--outer\r\n\
Content-Type: message/rfc822\r\n\
\r\n\
From: c@example.com\r\n\
Subject: inner\r\n\
Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain\r\n\
\r\n\
Pay the invoice.\r\n\
--inner--\r\n\
--outer--\r\n";
        let body = extract_plain_text(raw.as_bytes());
        assert!(body.contains("See forwarded."));
        assert!(body.contains("Pay the invoice."));
    }

    #[test]
    fn test_invalid_bytes_are_dropped() {
        assert_eq!(decode_dropping_invalid(b"ab\xffcd"), "abcd");
    }

    #[test]
    fn test_invalid_utf8_in_multipart_text_part_is_dropped() {
        let mut raw = b"From: a@example.com\r\n\
Content-Type: multipart/mixed; boundary=\"b\"\r\n\
\r\n\
--b\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: 8bit\r\n\
\r\n"
            .to_vec();
        raw.extend_from_slice(b"ab\xff\xfecd\r\n--b--\r\n");

        let body = extract_plain_text(&raw);
        assert!(!body.contains(char::REPLACEMENT_CHARACTER));
        assert_eq!(body.trim_end(), "abcd");
    }

    #[test]
    fn test_invalid_utf8_in_single_part_is_dropped() {
        let mut raw = b"From: a@example.com\r\n\
Subject: bytes\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: 8bit\r\n\
\r\n"
            .to_vec();
        raw.extend_from_slice(b"ab\xff\xfecd\r\n");

        assert_eq!(extract_plain_text(&raw), "abcd\n");
    }

    #[test]
    fn test_build_then_extract_round_trip() {
        let text = "Email ID 1:\n- Buy milk\n- Call Sam about the naïve plan\n";
        let raw = build_plain_text("bot@example.com", "me@example.com", "Todos", text).unwrap();

        let parsed = MessageParser::default().parse(&raw).unwrap();
        assert_eq!(parsed.subject(), Some("Todos"));
        assert_eq!(extract_plain_text(&raw).trim_end(), text.trim_end());
    }

    #[test]
    fn test_build_rejects_invalid_address() {
        let err = build_plain_text("me", "me@example.com", "s", "b").unwrap_err();
        assert!(matches!(err, DigestError::MailSend(_)));
    }
}
