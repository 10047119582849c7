//! Known crawler registry and verification.
//!
//! Identifies crawlers by User-Agent and corroborates the claim with:
//! - Static address prefixes (Meta fetchers)
//! - Reverse DNS hostname suffixes
//!
//! Anything that looks automated but is not a registered crawler is denied.

use crate::decision::{BotCategory, Decision, DenyReason};
use crate::detectors::UNKNOWN_SOURCE;
use crate::dns::{normalize_hostname, ReverseResolver};
use regex::Regex;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

/// A registered crawler.
pub struct KnownCrawler {
    /// Display name (e.g., "Googlebot")
    pub name: &'static str,
    /// Crawler category
    pub category: BotCategory,
    /// Case-insensitive User-Agent pattern
    pub pattern: Regex,
    /// Accepted reverse DNS suffixes; empty means the User-Agent alone is trusted
    pub hostname_suffixes: &'static [&'static str],
}

impl KnownCrawler {
    fn new(
        name: &'static str,
        category: BotCategory,
        pattern: &str,
        hostname_suffixes: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            category,
            pattern: Regex::new(&format!("(?i){}", regex::escape(pattern)))
                .expect("valid regex: crawler pattern"),
            hostname_suffixes,
        }
    }

    /// Returns true if any resolved hostname ends with an accepted suffix.
    pub fn hostname_matches(&self, hostnames: &[String]) -> bool {
        hostnames.iter().any(|hostname| {
            let hostname = normalize_hostname(hostname);
            self.hostname_suffixes
                .iter()
                .any(|suffix| hostname.ends_with(suffix))
        })
    }
}

/// A provider whose fetchers are trusted by source address prefix.
pub struct IpBypassRule {
    /// Provider name for logs (e.g., "Meta")
    pub provider: &'static str,
    /// Case-insensitive pattern for the provider's fetcher User-Agents
    pub user_agent: Regex,
    /// Textual address prefixes of the provider's published ranges
    pub ip_prefixes: &'static [&'static str],
}

impl IpBypassRule {
    /// Returns true if the User-Agent is the provider's and the source
    /// address starts with one of its prefixes.
    pub fn matches(&self, ua: &str, source_address: &str) -> bool {
        self.user_agent.is_match(ua)
            && self
                .ip_prefixes
                .iter()
                .any(|prefix| source_address.starts_with(prefix))
    }
}

/// Crawler registry, evaluated in order. Doubles as the allowlist.
pub static CRAWLER_REGISTRY: LazyLock<Vec<KnownCrawler>> = LazyLock::new(|| {
    use BotCategory::*;
    vec![
        KnownCrawler::new("Googlebot", SearchEngine, "Googlebot", &[".googlebot.com", ".google.com"]),
        KnownCrawler::new("Bingbot", SearchEngine, "Bingbot", &[".search.msn.com"]),
        KnownCrawler::new("Yahoo Slurp", SearchEngine, "Slurp", &[".crawl.yahoo.net"]),
        KnownCrawler::new("DuckDuckBot", SearchEngine, "DuckDuckBot", &[".duckduckgo.com"]),
        KnownCrawler::new("YandexBot", SearchEngine, "YandexBot", &[".yandex.com", ".yandex.ru"]),
        KnownCrawler::new("SemrushBot", SeoTool, "SemrushBot", &[".bot.semrush.com", ".semrush.com"]),
        KnownCrawler::new(
            "Screaming Frog",
            SeoTool,
            "Screaming Frog SEO Spider",
            &[".screamingfrog.co.uk"],
        ),
        KnownCrawler::new("Applebot", SearchEngine, "Applebot", &[".applebot.apple.com"]),
        KnownCrawler::new("Twitterbot", SocialMedia, "Twitterbot", &[".twitter.com"]),
        KnownCrawler::new("Facebot", SocialMedia, "facebot", &[".facebook.com"]),
        KnownCrawler::new("Facebook", SocialMedia, "facebookexternalhit", &[".facebook.com"]),
        KnownCrawler::new("Meta", SocialMedia, "meta-externalagent", &[".facebook.com"]),
        KnownCrawler::new("ChatGPT-User", AiAgent, "ChatGPT-User", &[]),
    ]
});

/// Allowlisted without a registry entry: never DNS-verified, never denied
/// as a generic bot.
static ALWAYS_ALLOW: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"(?i)uptime-kuma").expect("valid regex: uptime-kuma")]
});

/// Automation tool signatures. Any match suffices.
static BOT_SIGNATURES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        "bot", "crawler", "spider", "crawl", "fetch", "scrapy",
        "python", "httpclient", "curl", "wget", "axios",
        "node-fetch", "PostmanRuntime", "headlesschrome", "go-http-client",
        "java", "perl", "libwww", "Yeti", "AhrefsBot", "MJ12bot",
        "DotBot", "PetalBot", "SEOkicks", "Baiduspider", "Bytespider",
        "GPTBot", "ClaudeBot",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", regex::escape(p))).expect("valid regex: bot signature"))
    .collect()
});

/// Address-prefix bypasses. Meta's reverse DNS is unreliable in some
/// environments while its ranges are published.
pub static IP_BYPASS_RULES: LazyLock<Vec<IpBypassRule>> = LazyLock::new(|| {
    vec![IpBypassRule {
        provider: "Meta",
        user_agent: Regex::new(r"(?i)facebookexternalhit|meta-externalagent|facebot")
            .expect("valid regex: meta fetchers"),
        ip_prefixes: &["2a03:2880:", "31.13.", "69.171.", "66.220.", "129.134."],
    }]
});

/// Returns the first registry entry matching the User-Agent.
pub fn find_crawler(ua: &str) -> Option<&'static KnownCrawler> {
    CRAWLER_REGISTRY.iter().find(|crawler| crawler.pattern.is_match(ua))
}

/// Returns true if the User-Agent is on the allowlist.
pub fn is_allowlisted(ua: &str) -> bool {
    find_crawler(ua).is_some() || ALWAYS_ALLOW.iter().any(|p| p.is_match(ua))
}

/// Returns true if the User-Agent matches an automation tool signature.
pub fn matches_bot_signature(ua: &str) -> bool {
    BOT_SIGNATURES.iter().any(|p| p.is_match(ua))
}

/// Crawler verifier.
pub struct CrawlerVerifier {
    resolver: Arc<dyn ReverseResolver>,
    verbose: bool,
}

impl CrawlerVerifier {
    /// Create a verifier using the given resolver.
    pub fn new(resolver: Arc<dyn ReverseResolver>, verbose: bool) -> Self {
        Self { resolver, verbose }
    }

    /// Classify a structurally valid request.
    pub async fn verify(&self, ua: &str, source_address: &str) -> Decision {
        let allowlisted = is_allowlisted(ua);
        let generic_bot = !allowlisted && matches_bot_signature(ua);

        if let Some(rule) = IP_BYPASS_RULES
            .iter()
            .find(|rule| rule.matches(ua, source_address))
        {
            if self.verbose {
                info!(
                    client_ip = %source_address,
                    user_agent = ua,
                    provider = rule.provider,
                    "Provider address bypasses DNS verification"
                );
            }
            return Decision::AllowSilent;
        }

        if source_address != UNKNOWN_SOURCE {
            if let Some(crawler) = find_crawler(ua) {
                return self.verify_crawler(crawler, ua, source_address).await;
            }
        }

        if generic_bot {
            if self.verbose {
                warn!(client_ip = %source_address, user_agent = ua, "Suspicious bot blocked");
            }
            return Decision::Deny(DenyReason::GenericBotSignatureMatch);
        }

        Decision::Allow
    }

    /// Verify a claimed crawler identity via reverse DNS.
    async fn verify_crawler(
        &self,
        crawler: &KnownCrawler,
        ua: &str,
        source_address: &str,
    ) -> Decision {
        if crawler.hostname_suffixes.is_empty() {
            return Decision::Allow;
        }

        let ip: IpAddr = match source_address.parse() {
            Ok(ip) => ip,
            Err(_) => {
                if self.verbose {
                    warn!(
                        client_ip = %source_address,
                        user_agent = ua,
                        crawler = crawler.name,
                        "Source address is not an IP, cannot verify crawler"
                    );
                }
                return Decision::Deny(DenyReason::DnsResolutionFailure);
            }
        };

        match self.resolver.reverse(ip).await {
            Ok(hostnames) if crawler.hostname_matches(&hostnames) => {
                if self.verbose {
                    info!(
                        client_ip = %ip,
                        crawler = crawler.name,
                        category = crawler.category.as_str(),
                        ?hostnames,
                        "Crawler verified"
                    );
                }
                Decision::Allow
            }
            Ok(hostnames) => {
                if self.verbose {
                    warn!(
                        client_ip = %ip,
                        user_agent = ua,
                        crawler = crawler.name,
                        ?hostnames,
                        "Fake crawler blocked"
                    );
                }
                Decision::Deny(DenyReason::SpoofedCrawler)
            }
            Err(e) if e.is_unsupported() => {
                if self.verbose {
                    warn!(
                        client_ip = %ip,
                        user_agent = ua,
                        crawler = crawler.name,
                        error = %e,
                        "Reverse lookup unsupported, allowing known crawler unverified"
                    );
                }
                Decision::Allow
            }
            Err(e) => {
                if self.verbose {
                    warn!(
                        client_ip = %ip,
                        user_agent = ua,
                        crawler = crawler.name,
                        error = %e,
                        "Reverse lookup failed"
                    );
                }
                Decision::Deny(DenyReason::DnsResolutionFailure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::LookupError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    struct FixedResolver {
        answer: Result<Vec<String>, LookupError>,
        calls: AtomicUsize,
    }

    impl FixedResolver {
        fn new(answer: Result<Vec<String>, LookupError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReverseResolver for FixedResolver {
        async fn reverse(&self, _ip: IpAddr) -> Result<Vec<String>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn hosts(names: &[&str]) -> Result<Vec<String>, LookupError> {
        Ok(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(find_crawler(GOOGLEBOT).map(|c| c.name), Some("Googlebot"));
        assert_eq!(
            find_crawler("facebookexternalhit/1.1").map(|c| c.category),
            Some(BotCategory::SocialMedia)
        );
        assert!(find_crawler("Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0").is_none());
    }

    #[test]
    fn test_uptime_monitor_is_allowlisted_without_entry() {
        assert!(is_allowlisted("Uptime-Kuma/1.23.0"));
        assert!(find_crawler("Uptime-Kuma/1.23.0").is_none());
    }

    #[test]
    fn test_bot_signatures() {
        assert!(matches_bot_signature("python-requests/2.31.0"));
        assert!(matches_bot_signature("Go-http-client/1.1"));
        assert!(!matches_bot_signature("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"));
    }

    #[test]
    fn test_hostname_suffix_match() {
        let google = find_crawler(GOOGLEBOT).unwrap();
        assert!(google.hostname_matches(&["crawl-66-249-66-1.googlebot.com.".to_string()]));
        assert!(!google.hostname_matches(&["evil.example.com".to_string()]));
        assert!(!google.hostname_matches(&[]));
    }

    #[tokio::test]
    async fn test_genuine_crawler() {
        let resolver = FixedResolver::new(hosts(&["crawl-66-249-66-1.googlebot.com"]));
        let verifier = CrawlerVerifier::new(resolver.clone(), false);
        let decision = verifier.verify(GOOGLEBOT, "66.249.66.1").await;
        assert_eq!(decision, Decision::Allow);
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_spoofed_crawler() {
        let resolver = FixedResolver::new(hosts(&["evil.example.com"]));
        let verifier = CrawlerVerifier::new(resolver, false);
        let decision = verifier.verify(GOOGLEBOT, "203.0.113.9").await;
        assert_eq!(decision, Decision::Deny(DenyReason::SpoofedCrawler));
    }

    #[tokio::test]
    async fn test_unsupported_lookup_fails_open() {
        let resolver = FixedResolver::new(Err(LookupError::Unsupported("not implemented".into())));
        let verifier = CrawlerVerifier::new(resolver, false);
        assert_eq!(verifier.verify(GOOGLEBOT, "66.249.66.1").await, Decision::Allow);
    }

    #[tokio::test]
    async fn test_failed_lookup_denies() {
        for error in [LookupError::Timeout, LookupError::NoRecords, LookupError::Resolver("servfail".into())] {
            let resolver = FixedResolver::new(Err(error));
            let verifier = CrawlerVerifier::new(resolver, false);
            assert_eq!(
                verifier.verify(GOOGLEBOT, "66.249.66.1").await,
                Decision::Deny(DenyReason::DnsResolutionFailure)
            );
        }
    }

    #[tokio::test]
    async fn test_meta_bypass_skips_dns() {
        let resolver = FixedResolver::new(hosts(&["evil.example.com"]));
        let verifier = CrawlerVerifier::new(resolver.clone(), false);
        let decision = verifier.verify("facebookexternalhit/1.1", "31.13.24.2").await;
        assert_eq!(decision, Decision::AllowSilent);
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_meta_outside_ranges_is_dns_verified() {
        let resolver = FixedResolver::new(hosts(&["fwdproxy-odn-001.fbsv.net"]));
        let verifier = CrawlerVerifier::new(resolver.clone(), false);
        let decision = verifier.verify("facebookexternalhit/1.1", "198.51.100.4").await;
        assert_eq!(decision, Decision::Deny(DenyReason::SpoofedCrawler));
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_trusted_name_skips_dns() {
        let resolver = FixedResolver::new(hosts(&[]));
        let verifier = CrawlerVerifier::new(resolver.clone(), false);
        let ua = "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko); compatible; ChatGPT-User/1.0; +https://openai.com/bot";
        assert_eq!(verifier.verify(ua, "20.0.0.1").await, Decision::Allow);
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_source_skips_registry() {
        let resolver = FixedResolver::new(hosts(&["evil.example.com"]));
        let verifier = CrawlerVerifier::new(resolver.clone(), false);
        assert_eq!(verifier.verify(GOOGLEBOT, UNKNOWN_SOURCE).await, Decision::Allow);
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_address_denies_crawler() {
        let resolver = FixedResolver::new(hosts(&["crawl-66-249-66-1.googlebot.com"]));
        let verifier = CrawlerVerifier::new(resolver.clone(), false);
        assert_eq!(
            verifier.verify(GOOGLEBOT, "not-an-ip").await,
            Decision::Deny(DenyReason::DnsResolutionFailure)
        );
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_generic_bot_denied() {
        let resolver = FixedResolver::new(hosts(&[]));
        let verifier = CrawlerVerifier::new(resolver.clone(), false);
        assert_eq!(
            verifier.verify("python-requests/2.31.0", "198.51.100.1").await,
            Decision::Deny(DenyReason::GenericBotSignatureMatch)
        );
        assert_eq!(resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_ordinary_browser_allowed() {
        let resolver = FixedResolver::new(hosts(&[]));
        let verifier = CrawlerVerifier::new(resolver.clone(), true);
        let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
        assert_eq!(verifier.verify(ua, "198.51.100.1").await, Decision::Allow);
        assert_eq!(resolver.calls(), 0);
    }
}
