use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Centralized registry for PII redaction regex patterns.
///
/// All patterns are vetted literals; each construction site carries a single
/// allow for the infallible compile.
pub struct PiiRegexRegistry;

impl PiiRegexRegistry {
    /// Email pattern: matches standard email addresses
    pub fn email() -> &'static Regex {
        static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b").unwrap()
        });
        &EMAIL_REGEX
    }

    /// Phone-like digit runs: seven or more digits, optionally separated by
    /// spaces, dashes, dots or parentheses, with an optional leading `+`.
    pub fn phone() -> &'static Regex {
        static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
            #[allow(clippy::unwrap_used)]
            Regex::new(r"\+?\d(?:[\s\-.()]*\d){6,}").unwrap()
        });
        &PHONE_REGEX
    }
}

/// Redacts sensitive information from a string.
///
/// Emails keep the first character of the local part and the full domain.
/// Phone-like digit runs keep only their last four digits.
///
/// Emails are processed first so their digits are not treated as phones.
pub fn redact(input: &str) -> String {
    let email_redacted = PiiRegexRegistry::email().replace_all(input, |caps: &regex::Captures| {
        let full_match = &caps[0];
        match full_match.find('@') {
            Some(0) | None => full_match.to_string(),
            Some(at_pos) => {
                let first_char = &full_match[..1];
                format!("{first_char}***{}", &full_match[at_pos..])
            }
        }
    });

    PiiRegexRegistry::phone()
        .replace_all(&email_redacted, |caps: &regex::Captures| {
            let digits: Vec<char> = caps[0].chars().filter(char::is_ascii_digit).collect();
            let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
            format!("***{tail}")
        })
        .to_string()
}

/// A wrapper that redacts sensitive strings when displayed.
pub struct Redacted<'a>(pub &'a str);

impl<'a> fmt::Display for Redacted<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(self.0))
    }
}

impl<'a> fmt::Debug for Redacted<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact(self.0))
    }
}
