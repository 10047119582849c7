//! User-Agent structural validation.
//!
//! Rejects User-Agents that real browsers and declared crawlers never send:
//! - Empty or whitespace-only strings
//! - Strings under 10 characters
//! - Short purely alphanumeric placeholders ("test12345")
//! - Bare tool names with no version, comment, or platform token

use crate::decision::MalformedReason;
use regex::Regex;
use std::sync::LazyLock;

/// Minimum plausible User-Agent length, in characters.
const MIN_LENGTH: usize = 10;

/// Alphanumeric-only strings shorter than this are placeholders.
const GENERIC_MAX_LENGTH: usize = 15;

static ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("valid regex: alphanumeric"));

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[()]").expect("valid regex: comment"));

/// Rendering-engine and vendor tokens found in real browser strings.
static PLATFORM_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)WebKit|Apple").expect("valid regex: platform token"));

/// A single CLI-style name with nothing else.
static TOKEN_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9 _-]{5,40}$").expect("valid regex: token only"));

/// Structural validator for User-Agent strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

impl StructuralValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Apply the unconditional rules. These fire even for strings that
    /// resemble an allowlisted crawler.
    pub fn check_malformed(&self, ua: &str) -> Option<MalformedReason> {
        if ua.trim().is_empty() {
            return Some(MalformedReason::Empty);
        }

        let len = ua.chars().count();
        if len < MIN_LENGTH {
            return Some(MalformedReason::TooShort);
        }

        if len < GENERIC_MAX_LENGTH && ALPHANUMERIC.is_match(ua) {
            return Some(MalformedReason::Generic);
        }

        None
    }

    /// Returns true if the string lacks the token/comment shape of a real
    /// client. Callers skip this rule for allowlisted crawlers.
    pub fn lacks_structure(&self, ua: &str) -> bool {
        let unstructured =
            !ua.contains('/') && !COMMENT.is_match(ua) && !PLATFORM_TOKEN.is_match(ua);

        unstructured || TOKEN_ONLY.is_match(ua)
    }
}
