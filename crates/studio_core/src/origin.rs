//! Backend origin resolution.
//!
//! The primary origin is resolved once from the page location, in this order:
//! the `api` query parameter, a loopback page host (dev port on the same
//! host), the backend's own production host (same origin), and finally the
//! hardcoded production origin. The backup origin only comes into play after a
//! connection-level failure against the primary; see [`OriginSlot`].

use url::{Host, Url};

pub const PRODUCTION_HOST: &str = "api.web3growthlab.com";
pub const PRODUCTION_ORIGIN: &str = "https://api.web3growthlab.com";
pub const BACKUP_ORIGIN: &str = "https://web3growthlab-tool-studio.fly.dev";
pub const DEV_PORT: u16 = 8450;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginConfig {
    pub production_origin: String,
    pub production_host: String,
    pub backup_origin: String,
    pub dev_port: u16,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            production_origin: PRODUCTION_ORIGIN.to_string(),
            production_host: PRODUCTION_HOST.to_string(),
            backup_origin: BACKUP_ORIGIN.to_string(),
            dev_port: DEV_PORT,
        }
    }
}

/// Query parameters the hosting page understands. Empty values count as absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    pub api: Option<String>,
    pub key: Option<String>,
    pub tool: Option<String>,
}

impl QueryParams {
    pub fn from_page(page: &Url) -> Self {
        let mut params = Self::default();
        for (name, value) in page.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match &*name {
                "api" => &mut params.api,
                "key" => &mut params.key,
                "tool" => &mut params.tool,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        params
    }
}

pub fn resolve_primary_origin(page: &Url, config: &OriginConfig) -> String {
    if let Some(api) = QueryParams::from_page(page).api {
        return strip_trailing_slashes(&api).to_string();
    }

    let Some(host) = page.host() else {
        return strip_trailing_slashes(&config.production_origin).to_string();
    };

    if is_loopback(&host) {
        return format!("{}://{}:{}", page.scheme(), host, config.dev_port);
    }

    if let Host::Domain(domain) = host {
        if domain.eq_ignore_ascii_case(&config.production_host) {
            return page.origin().ascii_serialization();
        }
    }

    strip_trailing_slashes(&config.production_origin).to_string()
}

pub fn strip_trailing_slashes(origin: &str) -> &str {
    origin.trim_end_matches('/')
}

fn is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(addr) => addr.is_loopback() || addr.is_unspecified(),
        Host::Ipv6(addr) => addr.is_loopback(),
    }
}

/// Which origin requests currently go to.
///
/// The only transition is `Primary -> Backup`. The primary is never retried
/// for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginSlot {
    #[default]
    Primary,
    Backup,
}

impl OriginSlot {
    /// Moves to the backup slot. Returns `false` if already there.
    pub fn fail_over(&mut self) -> bool {
        match self {
            OriginSlot::Primary => {
                *self = OriginSlot::Backup;
                true
            }
            OriginSlot::Backup => false,
        }
    }
}
