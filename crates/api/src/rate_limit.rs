//! Rate limiting for the query and voice routes
//!
//! Per-peer-IP limits with tower_governor (GCRA). Each query can fan out to
//! a paid vision model, so these routes are throttled.

use std::sync::Arc;

use governor::middleware::StateInformationMiddleware;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;

/// Governor config with X-RateLimit-* headers
pub type QueryGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Requests that can be made immediately
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 2,
            burst_size: 5,
        }
    }
}

/// Governor config, or `None` when the limits are zero (disabled).
///
/// Needs `into_make_service_with_connect_info::<SocketAddr>()` so the
/// peer address is available.
pub fn create_governor_config(config: &RateLimitConfig) -> Option<Arc<QueryGovernorConfig>> {
    GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .map(Arc::new)
}

pub fn governor_layer(
    config: &RateLimitConfig,
) -> Option<GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware>> {
    create_governor_config(config).map(|config| GovernorLayer { config })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.per_second, 2);
        assert_eq!(config.burst_size, 5);
        assert!(create_governor_config(&config).is_some());
    }

    #[test]
    fn test_zero_limits_disable() {
        let config = RateLimitConfig {
            per_second: 0,
            burst_size: 0,
        };
        assert!(create_governor_config(&config).is_none());
        assert!(governor_layer(&config).is_none());
    }
}
