//! MIME message assembly.
//!
//! The message carries exactly three headers, in this order: `Subject`,
//! `MIME-version` and `Content-Type`, followed by a blank line and the
//! rendered body. Line endings are normalised to CRLF.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use crate::config::MailerConfig;
use crate::submission::Submission;
use crate::template::BodyFormat;

/// Subject used when none is configured and the submitter gave no name.
const DEFAULT_SUBJECT: &str = "Contact Form";

const SUBJECT_PREFIX: &str = "Subject: ";

/// Preferred header line length, excluding CRLF (RFC 5322 2.1.1).
const FOLD_WIDTH: usize = 78;

/// Hard header line limit, excluding CRLF (RFC 5322 2.1.1).
const MAX_LINE_OCTETS: usize = 998;

/// Largest number of payload bytes per encoded-word. 45 bytes encode to 60
/// base64 characters, which keeps `=?utf-8?b?...?=` within 75 characters
/// (RFC 2047 2).
const ENCODED_WORD_BYTES: usize = 45;

/// Subject line for a submission: the configured override, or one derived
/// from the submitter's name.
pub fn subject_for(config: &MailerConfig, submission: &Submission) -> String {
    if let Some(subject) = config.subject_override() {
        return subject.to_owned();
    }
    let name = submission.name.trim();
    if name.is_empty() {
        DEFAULT_SUBJECT.to_owned()
    } else {
        format!("{DEFAULT_SUBJECT} - {name}")
    }
}

/// Assemble the raw message handed to the SMTP transport.
pub fn assemble(subject: &str, format: BodyFormat, body: &str) -> Vec<u8> {
    let mut raw = String::with_capacity(body.len() + 128);
    raw.push_str(SUBJECT_PREFIX);
    raw.push_str(&encode_header_value(subject));
    raw.push_str("\r\n");
    raw.push_str("MIME-version: 1.0\r\n");
    raw.push_str("Content-Type: ");
    raw.push_str(format.content_type());
    raw.push_str("; charset=\"UTF-8\"\r\n");
    raw.push_str("\r\n");
    raw.push_str(&normalize_line_endings(body));
    raw.into_bytes()
}

/// Make a subject safe to write as a header.
///
/// CR and LF are folded into spaces so submitter-controlled text cannot start
/// a new header. ASCII values are folded at whitespace. Non-ASCII values, and
/// ASCII values with a run too long to fold under the line limit, become a
/// sequence of RFC 2047 base64 encoded-words, one per continuation line.
fn encode_header_value(value: &str) -> String {
    let single_line: String = value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    let folded = if single_line.is_ascii() {
        fold_ascii(&single_line)
    } else {
        None
    };
    folded.unwrap_or_else(|| encoded_words(&single_line))
}

/// Fold at spaces so lines stay near [`FOLD_WIDTH`]. Returns `None` when a
/// single word would still exceed [`MAX_LINE_OCTETS`].
fn fold_ascii(value: &str) -> Option<String> {
    let mut folded = String::with_capacity(value.len() + 8);
    let mut line_len = SUBJECT_PREFIX.len();
    let mut longest = 0;

    for (i, word) in value.split(' ').enumerate() {
        if i == 0 {
            folded.push_str(word);
            line_len += word.len();
        } else if !word.is_empty() && line_len + 1 + word.len() > FOLD_WIDTH {
            longest = longest.max(line_len);
            folded.push_str("\r\n ");
            folded.push_str(word);
            line_len = 1 + word.len();
        } else {
            folded.push(' ');
            folded.push_str(word);
            line_len += 1 + word.len();
        }
    }

    (longest.max(line_len) <= MAX_LINE_OCTETS).then_some(folded)
}

/// Split `value` on character boundaries into encoded-words joined by
/// folding whitespace.
fn encoded_words(value: &str) -> String {
    let mut words = Vec::new();
    let mut chunk = String::with_capacity(ENCODED_WORD_BYTES);
    for c in value.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_BYTES {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() || words.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join("\r\n ")
}

fn encoded_word(chunk: &str) -> String {
    format!("=?utf-8?b?{}?=", B64.encode(chunk.as_bytes()))
}

fn normalize_line_endings(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MailerConfig {
        MailerConfig::new("smtp.example.com", "forms@example.com")
            .with_recipients(["team@example.com"])
    }

    #[test]
    fn subject_derived_from_name() {
        let submission = Submission::new("Ann", "ann@example.com", "Hi");
        assert_eq!(subject_for(&config(), &submission), "Contact Form - Ann");
    }

    #[test]
    fn empty_configured_subject_falls_back_to_name() {
        let submission = Submission::new("Ann", "", "");
        let config = config().with_subject("");
        assert_eq!(subject_for(&config, &submission), "Contact Form - Ann");
    }

    #[test]
    fn configured_subject_wins() {
        let submission = Submission::new("Ann", "", "");
        let config = config().with_subject("Custom");
        assert_eq!(subject_for(&config, &submission), "Custom");
    }

    #[test]
    fn nameless_submission_gets_bare_subject() {
        let submission = Submission::new("   ", "", "");
        assert_eq!(subject_for(&config(), &submission), "Contact Form");
    }

    #[test]
    fn assemble_orders_headers() {
        let raw = assemble("Contact Form - Ann", BodyFormat::Plain, "Name: Ann");
        let raw = String::from_utf8(raw).unwrap();
        assert_eq!(
            raw,
            "Subject: Contact Form - Ann\r\n\
             MIME-version: 1.0\r\n\
             Content-Type: text/plain; charset=\"UTF-8\"\r\n\
             \r\n\
             Name: Ann"
        );
    }

    #[test]
    fn assemble_html_content_type() {
        let raw = String::from_utf8(assemble("s", BodyFormat::Html, "<p>x</p>")).unwrap();
        assert!(raw.contains("Content-Type: text/html; charset=\"UTF-8\"\r\n"));
    }

    #[test]
    fn assemble_normalizes_body_line_endings() {
        let raw = String::from_utf8(assemble("s", BodyFormat::Plain, "a\nb\r\nc")).unwrap();
        assert!(raw.ends_with("\r\n\r\na\r\nb\r\nc"));
    }

    #[test]
    fn subject_cannot_inject_headers() {
        let raw = assemble("Hi\r\nBcc: victim@example.com", BodyFormat::Plain, "");
        let raw = String::from_utf8(raw).unwrap();
        assert!(raw.starts_with("Subject: Hi  Bcc: victim@example.com\r\n"));
        assert!(!raw.contains("\r\nBcc:"));
    }

    /// Decode a folded sequence of encoded-words back to text.
    fn decode_words(value: &str) -> String {
        value
            .split("\r\n ")
            .map(|word| {
                assert!(word.len() <= 75, "encoded-word too long: {}", word.len());
                let inner = word
                    .strip_prefix("=?utf-8?b?")
                    .and_then(|w| w.strip_suffix("?="))
                    .unwrap();
                String::from_utf8(B64.decode(inner).unwrap()).unwrap()
            })
            .collect()
    }

    fn header_lines(raw: &[u8]) -> Vec<String> {
        let raw = String::from_utf8(raw.to_vec()).unwrap();
        let (headers, _) = raw.split_once("\r\n\r\n").unwrap();
        headers.split("\r\n").map(str::to_owned).collect()
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let encoded = encode_header_value("Contact Form - Zoë");
        assert!(encoded.starts_with("=?utf-8?b?"));
        assert!(encoded.ends_with("?="));
        assert_eq!(decode_words(&encoded), "Contact Form - Zoë");
    }

    #[test]
    fn long_non_ascii_subject_is_split_into_short_words() {
        let subject = format!("Contact Form - {}", "é".repeat(40));
        let encoded = encode_header_value(&subject);
        assert!(encoded.contains("\r\n "));
        assert_eq!(decode_words(&encoded), subject);
    }

    #[test]
    fn long_ascii_subject_folds_at_whitespace() {
        let name = ["Annabelle"; 30].join(" ");
        let subject = format!("Contact Form - {name}");
        let raw = assemble(&subject, BodyFormat::Plain, "x");

        let lines = header_lines(&raw);
        let subject_lines: Vec<&String> = lines
            .iter()
            .take_while(|l| !l.starts_with("MIME-version"))
            .collect();
        assert!(subject_lines.len() > 1);
        assert!(subject_lines.iter().all(|l| l.len() <= FOLD_WIDTH));
        assert!(subject_lines[1..].iter().all(|l| l.starts_with(' ')));

        let unfolded: String = subject_lines.iter().map(|l| l.as_str()).collect();
        assert_eq!(unfolded, format!("Subject: {subject}"));
    }

    #[test]
    fn unbreakable_name_stays_under_line_limit() {
        let subject = format!("Contact Form - {}", "A".repeat(1200));
        let raw = assemble(&subject, BodyFormat::Plain, "x");

        let lines = header_lines(&raw);
        assert!(lines.iter().all(|l| l.len() <= MAX_LINE_OCTETS));
        assert_eq!(lines[lines.len() - 2], "MIME-version: 1.0");

        let folded = lines[..lines.len() - 2].join("\r\n");
        let value = folded.strip_prefix("Subject: ").unwrap();
        assert_eq!(decode_words(value), subject);
    }
}
