// geomatch_service/src/catalog.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use models::errors::Result;
use models::facility::Facility;

/// Read-only view of the facility catalog. Catalog maintenance is owned by an
/// external component; this core only lists.
#[async_trait]
pub trait FacilityCatalog: Send + Sync {
    async fn active_facilities(&self) -> Result<Vec<Facility>>;
}

/// In-memory catalog, used by tests and by embeddings that preload the list.
#[derive(Debug, Default)]
pub struct InMemoryFacilityCatalog {
    facilities: Arc<RwLock<HashMap<Uuid, Facility>>>,
}

impl InMemoryFacilityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, facility: Facility) {
        let mut facilities = self.facilities.write().await;
        facilities.insert(facility.id, facility);
    }
}

#[async_trait]
impl FacilityCatalog for InMemoryFacilityCatalog {
    async fn active_facilities(&self) -> Result<Vec<Facility>> {
        let facilities = self.facilities.read().await;
        Ok(facilities.values().filter(|f| f.active).cloned().collect())
    }
}
