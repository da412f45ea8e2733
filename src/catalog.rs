use dashmap::DashMap;

use crate::model::Money;

/// Vehicle catalog lookups needed while editing a reservation.
pub trait ResourceCatalog: Send + Sync {
    fn daily_price(&self, resource_id: &str) -> Option<Money>;
}

#[derive(Default)]
pub struct InMemoryCatalog {
    prices: DashMap<String, Money>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, resource_id: impl Into<String>, price: Money) {
        self.prices.insert(resource_id.into(), price);
    }

    pub fn with_price(self, resource_id: impl Into<String>, price: Money) -> Self {
        self.set_price(resource_id, price);
        self
    }
}

impl ResourceCatalog for InMemoryCatalog {
    fn daily_price(&self, resource_id: &str) -> Option<Money> {
        self.prices.get(resource_id).map(|e| *e.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_lookup() {
        let catalog = InMemoryCatalog::new().with_price("veh1", 80);
        assert_eq!(catalog.daily_price("veh1"), Some(80));
        assert_eq!(catalog.daily_price("veh2"), None);
        catalog.set_price("veh1", 95);
        assert_eq!(catalog.daily_price("veh1"), Some(95));
    }
}
