//! Classification outcomes and their categories.

use serde::{Deserialize, Serialize};

/// Crawler category classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotCategory {
    /// Search engine crawler (Google, Bing, etc.)
    SearchEngine,
    /// Social media link-preview fetcher (Facebook, Twitter, etc.)
    SocialMedia,
    /// SEO tool (Semrush, Screaming Frog)
    SeoTool,
    /// AI assistant fetching on behalf of a user
    AiAgent,
    /// Uptime monitoring service
    Monitoring,
}

impl BotCategory {
    /// Returns the category as a string for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BotCategory::SearchEngine => "search_engine",
            BotCategory::SocialMedia => "social_media",
            BotCategory::SeoTool => "seo_tool",
            BotCategory::AiAgent => "ai_agent",
            BotCategory::Monitoring => "monitoring",
        }
    }
}

/// Why a User-Agent was rejected by the unconditional structural rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    /// Empty after trimming whitespace
    Empty,
    /// Fewer than 10 characters
    TooShort,
    /// Short, purely alphanumeric placeholder
    Generic,
}

impl MalformedReason {
    /// Returns the reason as a string for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MalformedReason::Empty => "empty_user_agent",
            MalformedReason::TooShort => "too_short_user_agent",
            MalformedReason::Generic => "generic_user_agent",
        }
    }
}

/// Reason attached to a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Empty, too short, or generic User-Agent
    MalformedUserAgent(MalformedReason),
    /// No version separator, comment, or platform token
    AnomalousUserAgentStructure,
    /// Claims a registered crawler name but reverse DNS disagrees
    SpoofedCrawler,
    /// Reverse lookup failed for a reason other than missing capability
    DnsResolutionFailure,
    /// Matches a known automation tool signature
    GenericBotSignatureMatch,
}

impl DenyReason {
    /// Returns the reason as a string for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::MalformedUserAgent(reason) => reason.as_str(),
            DenyReason::AnomalousUserAgentStructure => "anomalous_user_agent_structure",
            DenyReason::SpoofedCrawler => "spoofed_crawler",
            DenyReason::DnsResolutionFailure => "dns_resolution_failure",
            DenyReason::GenericBotSignatureMatch => "generic_bot_signature_match",
        }
    }

    /// Public response body. Only the broad category is revealed.
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::MalformedUserAgent(_) => "Access denied: invalid User-Agent",
            DenyReason::AnomalousUserAgentStructure => "Access denied: anomalous User-Agent",
            DenyReason::SpoofedCrawler | DenyReason::DnsResolutionFailure => {
                "Access denied: unverified crawler"
            }
            DenyReason::GenericBotSignatureMatch => "Access denied: automated clients are not allowed",
        }
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "reason")]
pub enum Decision {
    /// Request proceeds to the application
    Allow,
    /// Request proceeds, reached through an exemption or bypass path
    AllowSilent,
    /// Request is rejected with 403
    Deny(DenyReason),
}

impl Decision {
    /// Returns true if the request may proceed.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Deny(_))
    }

    /// Returns the deny reason, if any.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Deny(reason) => Some(*reason),
            _ => None,
        }
    }
}
