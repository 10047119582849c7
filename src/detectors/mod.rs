//! Request classification stages.
//!
//! The structural validator runs first and is pure; the crawler verifier
//! follows and may suspend on a reverse DNS lookup.

pub mod known_bots;
pub mod user_agent;

pub use known_bots::CrawlerVerifier;
pub use user_agent::StructuralValidator;

use std::net::IpAddr;

/// Source address used when neither a forwarded-for entry nor a
/// connection address is available.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// The per-request inputs to classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignal {
    /// First forwarded-for entry, connection address, or [`UNKNOWN_SOURCE`]
    pub source_address: String,
    /// Raw User-Agent header, empty when absent
    pub user_agent: String,
    /// Request path
    pub path: String,
}

impl RequestSignal {
    /// Create a signal from already-extracted parts.
    pub fn new(
        source_address: impl Into<String>,
        user_agent: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            source_address: source_address.into(),
            user_agent: user_agent.into(),
            path: path.into(),
        }
    }

    /// Build a signal from header values and the connection address.
    pub fn from_parts(
        path: &str,
        forwarded_for: Option<&str>,
        peer: Option<IpAddr>,
        user_agent: Option<&str>,
    ) -> Self {
        let forwarded = forwarded_for
            .and_then(|chain| chain.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty());

        let source_address = match (forwarded, peer) {
            (Some(first), _) => first.to_string(),
            (None, Some(ip)) => ip.to_string(),
            (None, None) => UNKNOWN_SOURCE.to_string(),
        };

        Self {
            source_address,
            user_agent: user_agent.unwrap_or_default().to_string(),
            path: path.to_string(),
        }
    }

    /// Returns true if no address could be determined.
    pub fn source_is_unknown(&self) -> bool {
        self.source_address == UNKNOWN_SOURCE
    }
}
