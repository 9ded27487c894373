//! Runs against the database in `DATABASE_URL`, start one and use
//! `cargo test -- --ignored`
use super::*;
use serde_json::json;

async fn connect() -> sqlx::PgPool {
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let conn = establish_db_connection(&database_url, 2).await.unwrap();
    migrate(&conn).await.unwrap();
    conn
}

fn unique_name(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

#[tokio::test]
#[ignore]
async fn test_db_connection() {
    connect().await;
}

#[tokio::test]
#[ignore]
async fn crud_soil_devices() {
    let conn = connect().await;
    let store = PgDeviceStore::new(conn, Resource::Soil);
    let name = unique_name("field");

    // create
    let created = store
        .create(json!({ "device": name, "sensorData": [12, 14] }))
        .await
        .unwrap();
    assert!(created.is_named(&name));

    // read
    let found = store.find_one(&name).await.unwrap();
    assert_eq!(Some(created.clone()), found);
    assert!(store.find_all().await.unwrap().contains(&created));

    // duplicate
    let err = store
        .create(json!({ "device": name, "sensorData": [] }))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::StoreError::ConstraintViolation(_)));

    // update
    let updated = store
        .update_one(&name, json!({ "sensorData": [20] }))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.id, updated.id);
    assert_eq!(vec![json!(20)], updated.sensor_data);

    // delete
    let deleted = store.delete_one(&name).await.unwrap();
    assert_eq!(Some(updated), deleted);
    assert_eq!(None, store.find_one(&name).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn crud_scd_duplicates() {
    let conn = connect().await;
    let store = PgDeviceStore::new(conn, Resource::Scd);
    let name = unique_name("scd");

    let first = store
        .create(json!({ "device": name, "sensorData": [400] }))
        .await
        .unwrap();
    let second = store
        .create(json!({ "device": name, "sensorData": [{ "co2": 410 }] }))
        .await
        .unwrap();

    let all = store.find_all().await.unwrap();
    assert!(all.contains(&first));
    assert!(all.contains(&second));

    assert!(store.delete_one(&name).await.unwrap().is_some());
    assert!(store.delete_one(&name).await.unwrap().is_some());
    assert_eq!(None, store.delete_one(&name).await.unwrap());
}
