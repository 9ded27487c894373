use crate::error::StoreError;
use async_trait::async_trait;
use mushroom_core::{DeviceDocument, DevicePatch, DeviceRecord, Resource};
use serde_json::Value;
use std::sync::Arc;

pub mod device;
pub mod memory;

pub use device::PgDeviceStore;
pub use memory::MemoryDeviceStore;

/// Data access for one device collection.
///
/// Implementors only persist already validated documents. `create` and
/// `update_one` validate the raw request body first, so every backend
/// rejects the same malformed input.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_one(&self, name: &str) -> Result<Option<DeviceRecord>, StoreError>;

    async fn find_all(&self) -> Result<Vec<DeviceRecord>, StoreError>;

    async fn insert(&self, document: DeviceDocument) -> Result<DeviceRecord, StoreError>;

    async fn delete_one(&self, name: &str) -> Result<Option<DeviceRecord>, StoreError>;

    async fn apply(
        &self,
        name: &str,
        patch: DevicePatch,
    ) -> Result<Option<DeviceRecord>, StoreError>;

    async fn create(&self, body: Value) -> Result<DeviceRecord, StoreError> {
        let document = DeviceDocument::from_json(body)?;
        self.insert(document).await
    }

    async fn update_one(
        &self,
        name: &str,
        body: Value,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let patch = DevicePatch::from_json(body)?;
        self.apply(name, patch).await
    }
}

/// One store per resource, handed to the router at construction
#[derive(Clone)]
pub struct DeviceStores {
    pub scd: Arc<dyn DeviceStore>,
    pub soil: Arc<dyn DeviceStore>,
}

impl DeviceStores {
    pub fn get(&self, resource: Resource) -> Arc<dyn DeviceStore> {
        match resource {
            Resource::Scd => self.scd.clone(),
            Resource::Soil => self.soil.clone(),
        }
    }

    pub fn postgres(pool: &sqlx::PgPool) -> Self {
        DeviceStores {
            scd: Arc::new(PgDeviceStore::new(pool.clone(), Resource::Scd)),
            soil: Arc::new(PgDeviceStore::new(pool.clone(), Resource::Soil)),
        }
    }

    pub fn memory() -> Self {
        DeviceStores {
            scd: Arc::new(MemoryDeviceStore::new(Resource::Scd)),
            soil: Arc::new(MemoryDeviceStore::new(Resource::Soil)),
        }
    }
}

pub async fn establish_db_connection(
    database_url: &str,
    max_connections: u32,
) -> Result<sqlx::PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

pub async fn migrate(conn: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(conn).await
}

#[cfg(test)]
mod test;
