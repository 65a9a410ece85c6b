//! Ordered provider lists per asset class.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::models::AssetClass;
use crate::provider::ProviderAdapter;

/// Ordered adapter list for each asset class.
///
/// Order is the failover order: index 0 is tried first.
#[derive(Clone, Default)]
pub struct ProviderRoutes {
    routes: HashMap<AssetClass, Vec<Arc<dyn ProviderAdapter>>>,
}

impl ProviderRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with_route(
        mut self,
        asset_class: AssetClass,
        providers: Vec<Arc<dyn ProviderAdapter>>,
    ) -> Self {
        self.set(asset_class, providers);
        self
    }

    /// Replace the list for an asset class.
    pub fn set(&mut self, asset_class: AssetClass, providers: Vec<Arc<dyn ProviderAdapter>>) {
        self.routes.insert(asset_class, providers);
    }

    pub fn get(&self, asset_class: AssetClass) -> &[Arc<dyn ProviderAdapter>] {
        self.routes
            .get(&asset_class)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Provider ids for an asset class, in failover order.
    pub fn provider_ids(&self, asset_class: AssetClass) -> Vec<&'static str> {
        self.get(asset_class).iter().map(|p| p.id()).collect()
    }

    /// Asset classes with no providers at all.
    pub fn missing_classes(&self) -> Vec<AssetClass> {
        AssetClass::ALL
            .iter()
            .copied()
            .filter(|class| self.get(*class).is_empty())
            .collect()
    }

    /// Every adapter across all classes, once per distinct id.
    pub fn adapters(&self) -> Vec<Arc<dyn ProviderAdapter>> {
        let mut seen = Vec::new();
        let mut adapters = Vec::new();
        for class in AssetClass::ALL {
            for adapter in self.get(class) {
                if !seen.contains(&adapter.id()) {
                    seen.push(adapter.id());
                    adapters.push(Arc::clone(adapter));
                }
            }
        }
        adapters
    }
}

impl fmt::Debug for ProviderRoutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for class in AssetClass::ALL {
            map.entry(&class, &self.provider_ids(class));
        }
        map.finish()
    }
}
