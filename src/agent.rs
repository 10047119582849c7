//! Main crawler guard implementation.

use crate::config::CrawlerGuardConfig;
use crate::decision::{Decision, DenyReason};
use crate::detectors::known_bots::is_allowlisted;
use crate::detectors::{CrawlerVerifier, RequestSignal, StructuralValidator};
use crate::dns::{ReverseResolver, SystemResolver};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Path prefixes that bypass classification entirely.
pub const EXEMPT_PATH_PREFIXES: &[&str] = &["/api/health", "/api/sitemap"];

/// Request classifier placed in front of an application.
pub struct CrawlerGuard {
    /// Configuration
    config: CrawlerGuardConfig,
    /// Structural User-Agent validator
    validator: StructuralValidator,
    /// Crawler registry and DNS verification
    verifier: CrawlerVerifier,
}

impl CrawlerGuard {
    /// Create a guard backed by the system resolver.
    pub fn new(config: CrawlerGuardConfig) -> Self {
        let resolver = Arc::new(SystemResolver::new(&config.dns));
        Self::with_resolver(config, resolver)
    }

    /// Create a guard with a caller-supplied resolver.
    pub fn with_resolver(config: CrawlerGuardConfig, resolver: Arc<dyn ReverseResolver>) -> Self {
        let verifier = CrawlerVerifier::new(resolver, config.verbose);
        Self {
            config,
            validator: StructuralValidator::new(),
            verifier,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CrawlerGuardConfig {
        &self.config
    }

    /// Returns true if the path bypasses every check.
    pub fn is_exempt_path(path: &str) -> bool {
        EXEMPT_PATH_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    /// Classify one request.
    pub async fn evaluate(&self, signal: &RequestSignal) -> Decision {
        if Self::is_exempt_path(&signal.path) {
            return Decision::AllowSilent;
        }

        let verbose = self.config.verbose;
        let ua = signal.user_agent.as_str();

        if verbose {
            info!(
                client_ip = %signal.source_address,
                user_agent = ua,
                path = %signal.path,
                "Request received"
            );
        }

        if let Some(reason) = self.validator.check_malformed(ua) {
            if verbose {
                warn!(
                    client_ip = %signal.source_address,
                    user_agent = ua,
                    reason = reason.as_str(),
                    "Malformed User-Agent blocked"
                );
            }
            return Decision::Deny(DenyReason::MalformedUserAgent(reason));
        }

        if !is_allowlisted(ua) && self.validator.lacks_structure(ua) {
            if verbose {
                warn!(
                    client_ip = %signal.source_address,
                    user_agent = ua,
                    "User-Agent with anomalous structure blocked"
                );
            }
            return Decision::Deny(DenyReason::AnomalousUserAgentStructure);
        }

        let decision = self.verifier.verify(ua, &signal.source_address).await;

        debug!(
            client_ip = %signal.source_address,
            decision = ?decision,
            "Classification complete"
        );

        decision
    }
}
