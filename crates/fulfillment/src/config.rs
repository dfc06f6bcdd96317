//! Coordinator settings.

/// Tunables for courier search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorConfig {
    /// Couriers farther than this from the delivery point are not offered.
    pub courier_search_radius_km: f64,

    /// How many couriers to offer when the order has no delivery point.
    pub courier_fallback_limit: usize,
}

impl CoordinatorConfig {
    pub fn search_radius_m(&self) -> f64 {
        self.courier_search_radius_km * 1000.0
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            courier_search_radius_km: 10.0,
            courier_fallback_limit: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.courier_fallback_limit, 20);
        assert_eq!(config.search_radius_m(), 10_000.0);
    }
}
