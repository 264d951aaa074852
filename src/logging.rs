//! Tracing setup and log-safe message ids.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "safechatter=info,tower_http=info,warn";

/// Install the global subscriber. `RUST_LOG` sets the filter; `LOG_FORMAT=json`
/// switches to JSON lines. Safe to call more than once (later calls are no-ops).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Short anonymized id for chat text: first 6 bytes of SHA-256, hex.
/// Raw message text never goes into logs.
pub fn anon_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
