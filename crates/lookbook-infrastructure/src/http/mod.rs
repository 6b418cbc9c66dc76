// Transport layer: direct requests and the relay fallback chain

pub mod backend;
mod direct;
mod error;
mod relay;
mod resilient;
mod transport;

pub use backend::HttpBackendGateway;
pub use direct::DirectTransport;
pub use error::FetchError;
pub use relay::{looks_like_html, unwrap_relay_body, RelayKind, RelayTransport};
pub use resilient::ResilientFetchClient;
pub use transport::{redact_query, FetchRequest, HttpMethod, TransportStrategy};

pub(crate) const USER_AGENT: &str = concat!("lookbook/", env!("CARGO_PKG_VERSION"));

/// First `max` characters of a body, for log lines
pub(crate) fn snippet(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
