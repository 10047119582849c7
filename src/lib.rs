//! Crawler guard
//!
//! Classifies each incoming request as allowed, silently allowed, or denied
//! based on its User-Agent and source address.
//!
//! # Features
//!
//! - Structural User-Agent validation (empty, short, placeholder, bare tool names)
//! - Known crawler registry with reverse DNS verification
//! - Address-prefix bypass for providers with unreliable PTR records
//! - Automation tool signature blocking
//! - Health-check and sitemap path exemptions
//!
//! # Example
//!
//! ```ignore
//! use crawler_guard::{middleware::guard_layer, CrawlerGuard, CrawlerGuardConfig};
//! use std::sync::Arc;
//!
//! let guard = Arc::new(CrawlerGuard::new(CrawlerGuardConfig::default()));
//! let app = axum::Router::new()
//!     .route("/", axum::routing::get(|| async { "hello" }))
//!     .layer(axum::middleware::from_fn_with_state(guard, guard_layer));
//! ```

pub mod agent;
pub mod config;
pub mod decision;
pub mod detectors;
pub mod dns;
pub mod middleware;

pub use agent::CrawlerGuard;
pub use config::CrawlerGuardConfig;
pub use decision::{BotCategory, Decision, DenyReason, MalformedReason};
pub use detectors::RequestSignal;
pub use dns::{LookupError, ReverseResolver, SystemResolver};
