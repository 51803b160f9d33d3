/// Configuration for a [`Transport`](crate::Transport) instance.
///
/// Each transport carries its own copy; there is no process-wide
/// configuration state.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Emit a `tracing` debug event for every chunk written during a
    /// streamed upload.
    pub wire_debug: bool,
    /// Value sent as the `User-Agent` header on every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            wire_debug: false,
            user_agent: concat!("cumulus-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
