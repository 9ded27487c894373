use super::DeviceStore;
use crate::error::StoreError;
use async_trait::async_trait;
use mushroom_core::{DeviceDocument, DevicePatch, DeviceRecord, Resource};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;

#[derive(sqlx::FromRow, Debug)]
pub struct DeviceDao {
    pub(crate) id: i64,
    pub(crate) device: Option<String>,
    pub(crate) sensor_data: Json<Vec<Value>>,
}

impl From<DeviceDao> for DeviceRecord {
    fn from(dao: DeviceDao) -> Self {
        DeviceRecord {
            id: dao.id,
            device: dao.device,
            sensor_data: dao.sensor_data.0,
        }
    }
}

/// Statements of one collection, the table name is fixed per resource
struct Statements {
    find_one: String,
    find_all: String,
    insert: String,
    delete_one: String,
    update_one: String,
}

impl Statements {
    fn new(table: &str) -> Self {
        let columns = "id, device, sensor_data";
        let first_match = format!("(SELECT id FROM {table} WHERE device = $1 LIMIT 1)");
        Statements {
            find_one: format!("SELECT {columns} FROM {table} WHERE device = $1 LIMIT 1"),
            find_all: format!("SELECT {columns} FROM {table}"),
            insert: format!(
                "INSERT INTO {table} (device, sensor_data) VALUES ($1, $2) RETURNING {columns}"
            ),
            delete_one: format!(
                "DELETE FROM {table} WHERE id = {first_match} RETURNING {columns}"
            ),
            update_one: format!(
                "UPDATE {table} SET device = COALESCE($2, device), \
                 sensor_data = COALESCE($3, sensor_data) \
                 WHERE id = {first_match} RETURNING {columns}"
            ),
        }
    }
}

pub struct PgDeviceStore {
    conn: PgPool,
    resource: Resource,
    statements: Statements,
}

impl PgDeviceStore {
    pub fn new(conn: PgPool, resource: Resource) -> Self {
        PgDeviceStore {
            conn,
            resource,
            statements: Statements::new(resource.collection()),
        }
    }
}

impl std::fmt::Debug for PgDeviceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDeviceStore")
            .field("resource", &self.resource)
            .finish()
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    #[tracing::instrument(skip(self), fields(resource = %self.resource))]
    async fn find_one(&self, name: &str) -> Result<Option<DeviceRecord>, StoreError> {
        let dao = sqlx::query_as::<_, DeviceDao>(&self.statements.find_one)
            .bind(name)
            .fetch_optional(&self.conn)
            .await?;
        Ok(dao.map(DeviceRecord::from))
    }

    #[tracing::instrument(skip(self), fields(resource = %self.resource))]
    async fn find_all(&self) -> Result<Vec<DeviceRecord>, StoreError> {
        let daos = sqlx::query_as::<_, DeviceDao>(&self.statements.find_all)
            .fetch_all(&self.conn)
            .await?;
        Ok(daos.into_iter().map(DeviceRecord::from).collect())
    }

    #[tracing::instrument(skip(self), fields(resource = %self.resource))]
    async fn insert(&self, document: DeviceDocument) -> Result<DeviceRecord, StoreError> {
        let dao = sqlx::query_as::<_, DeviceDao>(&self.statements.insert)
            .bind(document.device)
            .bind(Json(document.sensor_data))
            .fetch_one(&self.conn)
            .await?;
        debug!("Persisted device {}", dao.id);
        Ok(dao.into())
    }

    #[tracing::instrument(skip(self), fields(resource = %self.resource))]
    async fn delete_one(&self, name: &str) -> Result<Option<DeviceRecord>, StoreError> {
        let dao = sqlx::query_as::<_, DeviceDao>(&self.statements.delete_one)
            .bind(name)
            .fetch_optional(&self.conn)
            .await?;
        Ok(dao.map(DeviceRecord::from))
    }

    #[tracing::instrument(skip(self), fields(resource = %self.resource))]
    async fn apply(
        &self,
        name: &str,
        patch: DevicePatch,
    ) -> Result<Option<DeviceRecord>, StoreError> {
        let dao = sqlx::query_as::<_, DeviceDao>(&self.statements.update_one)
            .bind(name)
            .bind(patch.device)
            .bind(patch.sensor_data.map(Json))
            .fetch_optional(&self.conn)
            .await?;
        Ok(dao.map(DeviceRecord::from))
    }
}
