//! `[serve]` section configuration.
//!
//! Contains static server settings.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[serve]` section in quire.toml - static server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 4000
/// workers = 8
/// log_requests = true    # Log matched requests, not just fallbacks
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 4000).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Threads answering requests.
    #[serde(default = "defaults::serve::workers")]
    #[educe(Default = defaults::serve::workers())]
    pub workers: usize,

    /// Log every matched request. Fallback hits are always logged.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub log_requests: bool,
}
