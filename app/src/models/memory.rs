use super::DeviceStore;
use crate::error::StoreError;
use async_trait::async_trait;
use mushroom_core::{DeviceDocument, DevicePatch, DeviceRecord, Resource};
use tokio::sync::RwLock;
use tracing::debug;

struct Collection {
    records: Vec<DeviceRecord>,
    next_id: i64,
}

/// Insertion ordered collection without persistence, used for tests
/// and `DATABASE_URL=memory://`
pub struct MemoryDeviceStore {
    resource: Resource,
    inner: RwLock<Collection>,
}

impl MemoryDeviceStore {
    pub fn new(resource: Resource) -> Self {
        MemoryDeviceStore {
            resource,
            inner: RwLock::new(Collection {
                records: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn check_unique(
        &self,
        records: &[DeviceRecord],
        name: Option<&str>,
        skip_id: Option<i64>,
    ) -> Result<(), StoreError> {
        let name = match name {
            Some(name) if self.resource.unique_device() => name,
            _ => return Ok(()),
        };
        let taken = records
            .iter()
            .any(|record| Some(record.id) != skip_id && record.is_named(name));
        if taken {
            return Err(StoreError::ConstraintViolation(format!(
                "{} device \"{}\" already exists",
                self.resource.label(),
                name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn find_one(&self, name: &str) -> Result<Option<DeviceRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .iter()
            .find(|record| record.is_named(name))
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<DeviceRecord>, StoreError> {
        Ok(self.inner.read().await.records.clone())
    }

    async fn insert(&self, document: DeviceDocument) -> Result<DeviceRecord, StoreError> {
        let mut inner = self.inner.write().await;
        self.check_unique(&inner.records, document.device.as_deref(), None)?;

        let record = DeviceRecord::new(inner.next_id, document);
        inner.next_id += 1;
        inner.records.push(record.clone());
        debug!("Stored {} device {}", self.resource, record.id);
        Ok(record)
    }

    async fn delete_one(&self, name: &str) -> Result<Option<DeviceRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        let position = inner.records.iter().position(|record| record.is_named(name));
        Ok(position.map(|index| inner.records.remove(index)))
    }

    async fn apply(
        &self,
        name: &str,
        patch: DevicePatch,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        let index = match inner.records.iter().position(|record| record.is_named(name)) {
            Some(index) => index,
            None => return Ok(None),
        };

        let id = inner.records[index].id;
        self.check_unique(&inner.records, patch.device.as_deref(), Some(id))?;

        let record = &mut inner.records[index];
        record.merge(patch);
        Ok(Some(record.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn named(name: &str, sensor_data: serde_json::Value) -> serde_json::Value {
        json!({ "device": name, "sensorData": sensor_data })
    }

    #[tokio::test]
    async fn test_crud_devices() {
        let store = MemoryDeviceStore::new(Resource::Soil);

        // create
        let created = store.create(named("field-3", json!([12, 14]))).await.unwrap();
        assert_eq!(1, created.id);
        assert_eq!(Some(created.clone()), store.find_one("field-3").await.unwrap());

        // update
        let updated = store
            .update_one("field-3", json!({ "sensorData": [20] }))
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_named("field-3"));
        assert_eq!(vec![json!(20)], updated.sensor_data);

        // delete
        let deleted = store.delete_one("field-3").await.unwrap();
        assert_eq!(Some(updated), deleted);
        assert_eq!(None, store.find_one("field-3").await.unwrap());
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_name_is_absent() {
        let store = MemoryDeviceStore::new(Resource::Scd);
        assert_eq!(None, store.find_one("nothing").await.unwrap());
        assert_eq!(None, store.delete_one("nothing").await.unwrap());
        assert_eq!(
            None,
            store.update_one("nothing", json!({})).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_soil_rejects_duplicates() {
        let store = MemoryDeviceStore::new(Resource::Soil);
        let first = store.create(named("bed-1", json!([1]))).await.unwrap();

        let err = store.create(named("bed-1", json!([2]))).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        assert_eq!(Some(first), store.find_one("bed-1").await.unwrap());
        assert_eq!(1, store.find_all().await.unwrap().len());
    }

    #[tokio::test]
    async fn test_soil_rejects_rename_onto_existing() {
        let store = MemoryDeviceStore::new(Resource::Soil);
        store.create(named("bed-1", json!([]))).await.unwrap();
        store.create(named("bed-2", json!([]))).await.unwrap();

        let err = store
            .update_one("bed-2", json!({ "device": "bed-1" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));

        // renaming onto itself is fine
        let same = store
            .update_one("bed-1", json!({ "device": "bed-1" }))
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn test_scd_accepts_duplicates() {
        let store = MemoryDeviceStore::new(Resource::Scd);
        let first = store.create(named("scd-1", json!([400]))).await.unwrap();
        let second = store.create(named("scd-1", json!([410]))).await.unwrap();
        assert_ne!(first.id, second.id);

        let all = store.find_all().await.unwrap();
        assert_eq!(vec![first.clone(), second], all);

        let found = store.find_one("scd-1").await.unwrap().unwrap();
        assert!(found.is_named("scd-1"));
    }

    #[tokio::test]
    async fn test_invalid_patch_leaves_record() {
        let store = MemoryDeviceStore::new(Resource::Scd);
        let created = store.create(named("scd-2", json!([1, 2]))).await.unwrap();

        let err = store
            .update_one("scd-2", json!({ "sensorData": "broken" }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(Some(created), store.find_one("scd-2").await.unwrap());
    }
}
