//! Application context
//!
//! One explicit context object replaces process-wide singletons: the entry
//! point constructs it once and passes it by reference into the components
//! that need configuration. The only key the core consumes is the network
//! endpoint.

use parking_lot::RwLock;

/// Default network endpoint
pub const DEFAULT_NETWORK_ENDPOINT: &str = "https://node.luminachain.network";

/// Shared application context
#[derive(Debug)]
pub struct AppContext {
    network_endpoint: RwLock<String>,
}

impl AppContext {
    /// Create a context with the default endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_NETWORK_ENDPOINT)
    }

    /// Create a context with a configured endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            network_endpoint: RwLock::new(endpoint.into()),
        }
    }

    /// The endpoint the sync engine should contact.
    pub fn network_endpoint(&self) -> String {
        self.network_endpoint.read().clone()
    }

    /// Store a new endpoint for future consumers.
    pub fn set_network_endpoint(&self, endpoint: impl Into<String>) {
        *self.network_endpoint.write() = endpoint.into();
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let ctx = AppContext::new();
        assert_eq!(ctx.network_endpoint(), DEFAULT_NETWORK_ENDPOINT);
    }

    #[test]
    fn test_endpoint_update() {
        let ctx = AppContext::with_endpoint("http://localhost:9070");
        ctx.set_network_endpoint("http://localhost:9071");
        assert_eq!(ctx.network_endpoint(), "http://localhost:9071");
    }
}
