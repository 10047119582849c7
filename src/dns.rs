//! Reverse DNS resolution used to corroborate crawler identities.

use crate::config::DnsConfig;
use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use thiserror::Error;
use tracing::warn;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::TokioAsyncResolver;

/// Failure of a reverse lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The runtime environment cannot perform reverse lookups at all
    #[error("reverse lookup unsupported: {0}")]
    Unsupported(String),

    /// No PTR records for the address
    #[error("no PTR records found")]
    NoRecords,

    /// The resolver gave up waiting
    #[error("reverse lookup timed out")]
    Timeout,

    /// Any other resolver error
    #[error("resolver error: {0}")]
    Resolver(String),
}

impl LookupError {
    /// Returns true if the failure reflects a missing capability rather
    /// than a negative or transient answer.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, LookupError::Unsupported(_))
    }
}

impl From<ResolveError> for LookupError {
    fn from(err: ResolveError) -> Self {
        match err.kind() {
            ResolveErrorKind::NoConnections => LookupError::Unsupported(err.to_string()),
            ResolveErrorKind::Io(e) if e.kind() == io::ErrorKind::Unsupported => {
                LookupError::Unsupported(err.to_string())
            }
            ResolveErrorKind::NoRecordsFound { .. } => LookupError::NoRecords,
            ResolveErrorKind::Timeout => LookupError::Timeout,
            _ => LookupError::Resolver(err.to_string()),
        }
    }
}

/// Resolves an address to its PTR hostnames.
#[async_trait]
pub trait ReverseResolver: Send + Sync {
    /// Look up the hostnames for `ip`. Hostnames may carry a trailing dot.
    async fn reverse(&self, ip: IpAddr) -> Result<Vec<String>, LookupError>;
}

/// Resolver backed by the host's DNS configuration.
pub struct SystemResolver {
    /// `None` when no usable configuration could be loaded
    resolver: Option<TokioAsyncResolver>,
}

impl SystemResolver {
    /// Build a resolver from settings.
    ///
    /// An unreadable system configuration does not fail construction; the
    /// resolver instead reports every lookup as unsupported.
    pub fn new(config: &DnsConfig) -> Self {
        let (resolver_config, mut opts) = if config.use_system_conf {
            match trust_dns_resolver::system_conf::read_system_conf() {
                Ok(parts) => parts,
                Err(e) => {
                    warn!(error = %e, "System DNS configuration unavailable, reverse lookups disabled");
                    return Self::unavailable();
                }
            }
        } else {
            (ResolverConfig::default(), ResolverOpts::default())
        };

        opts.timeout = config.timeout();
        opts.attempts = config.attempts;

        Self {
            resolver: Some(TokioAsyncResolver::tokio(resolver_config, opts)),
        }
    }

    /// A resolver that cannot perform lookups.
    pub fn unavailable() -> Self {
        Self { resolver: None }
    }
}

#[async_trait]
impl ReverseResolver for SystemResolver {
    async fn reverse(&self, ip: IpAddr) -> Result<Vec<String>, LookupError> {
        let resolver = self.resolver.as_ref().ok_or_else(|| {
            LookupError::Unsupported("no DNS configuration available".to_string())
        })?;

        let lookup = resolver.reverse_lookup(ip).await?;
        Ok(lookup.iter().map(|name| name.to_string()).collect())
    }
}

/// Normalize a PTR hostname for suffix comparison.
pub fn normalize_hostname(hostname: &str) -> String {
    hostname.trim_end_matches('.').to_ascii_lowercase()
}
