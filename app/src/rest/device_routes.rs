use super::{build_response, found_or_404, BODY_LIMIT};
use crate::error::RequestError;
use crate::models::DeviceStore;
use mushroom_core::Resource;
use percent_encoding::percent_decode_str;
use serde_json::map::Entry;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::Filter;

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub fn routes(
    resource: Resource,
    store: Arc<dyn DeviceStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    get_device(resource, store.clone())
        .or(get_devices(resource, store.clone()))
        .or(create_device(resource, store.clone()))
        .or(delete_device(resource, store.clone()))
        .or(update_device(resource, store))
}

/// GET /:resource/one/:device
///
/// Returns the first device with the given name, 404 if there is none
fn get_device(
    resource: Resource,
    store: Arc<dyn DeviceStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(warp::path(resource.path()))
        .and(warp::path("one"))
        .and(device_name())
        .and(warp::path::end())
        .and(warp::get())
        .and_then(|store: Arc<dyn DeviceStore>, name: String| async move {
            found_or_404(store.find_one(&name).await)
        })
        .boxed()
}

/// GET /:resource/devices
///
/// Returns every device of the collection, unordered
fn get_devices(
    resource: Resource,
    store: Arc<dyn DeviceStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(devices_path(resource))
        .and(warp::path::end())
        .and(warp::get())
        .and_then(|store: Arc<dyn DeviceStore>| async move {
            build_response(store.find_all().await, StatusCode::OK)
        })
        .boxed()
}

/// POST /:resource/devices
///
/// Creates a device from the body
///
/// Returns 201 with the stored device, including its `_id`
fn create_device(
    resource: Resource,
    store: Arc<dyn DeviceStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(devices_path(resource))
        .and(warp::path::end())
        .and(warp::post())
        .and(device_body())
        .and_then(move |store: Arc<dyn DeviceStore>, body: Value| async move {
            debug!("Creating {} device {}", resource, body);
            build_response(store.create(body).await, StatusCode::CREATED)
        })
        .boxed()
}

/// DELETE /:resource/devices/:device
///
/// Removes the first device with the given name
///
/// Returns the removed device, 404 if there is none
fn delete_device(
    resource: Resource,
    store: Arc<dyn DeviceStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(devices_path(resource))
        .and(device_name())
        .and(warp::path::end())
        .and(warp::delete())
        .and_then(|store: Arc<dyn DeviceStore>, name: String| async move {
            found_or_404(store.delete_one(&name).await)
        })
        .boxed()
}

/// PUT /:resource/devices/:device
///
/// Merges the body into the first device with the given name.
/// Fields missing in the body keep their value.
///
/// Returns the updated device, 404 if there is none
fn update_device(
    resource: Resource,
    store: Arc<dyn DeviceStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || store.clone())
        .and(devices_path(resource))
        .and(device_name())
        .and(warp::path::end())
        .and(warp::put())
        .and(device_body())
        .and_then(
            |store: Arc<dyn DeviceStore>, name: String, body: Value| async move {
                found_or_404(store.update_one(&name, body).await)
            },
        )
        .boxed()
}

fn devices_path(resource: Resource) -> impl Filter<Extract = (), Error = warp::Rejection> + Clone {
    warp::path(resource.path()).and(warp::path("devices"))
}

/// Percent-decoded path segment, undecodable escapes are a bad request
fn device_name() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::path::param::<String>().and_then(|raw: String| async move {
        percent_decode_str(&raw)
            .decode_utf8()
            .map(|name| name.into_owned())
            .map_err(|_| warp::reject::custom(RequestError::InvalidParameter(raw.clone())))
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BodyKind {
    Json,
    Form,
}

/// Media type of the body, a missing header is read as JSON
fn body_kind() -> impl Filter<Extract = (BodyKind,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("content-type").and_then(
        |content_type: Option<String>| async move {
            let essence = content_type
                .as_deref()
                .and_then(|value| value.split(';').next())
                .map(|value| value.trim().to_ascii_lowercase());
            match essence.as_deref() {
                None | Some(JSON_CONTENT_TYPE) => Ok(BodyKind::Json),
                Some(FORM_CONTENT_TYPE) => Ok(BodyKind::Form),
                Some(other) if other.ends_with("+json") => Ok(BodyKind::Json),
                Some(other) => Err(warp::reject::custom(
                    RequestError::UnsupportedMediaType(other.to_owned()),
                )),
            }
        },
    )
}

fn only(kind: BodyKind) -> impl Filter<Extract = (), Error = warp::Rejection> + Clone {
    body_kind()
        .and_then(move |found: BodyKind| async move {
            if found == kind {
                Ok(())
            } else {
                Err(warp::reject::not_found())
            }
        })
        .untuple_one()
}

/// JSON or url-encoded form. Only the matching branch reads the body.
fn device_body() -> impl Filter<Extract = (Value,), Error = warp::Rejection> + Clone {
    let form = only(BodyKind::Form)
        .and(warp::body::form::<Vec<(String, String)>>())
        .map(form_fields);
    let json = only(BodyKind::Json)
        .and(warp::body::bytes())
        .and_then(|bytes: Bytes| async move { json_body(&bytes) });

    warp::body::content_length_limit(BODY_LIMIT).and(form.or(json).unify())
}

/// An empty body is an empty document
fn json_body(bytes: &[u8]) -> Result<Value, warp::Rejection> {
    if bytes.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
        .map_err(|e| warp::reject::custom(RequestError::MalformedBody(e.to_string())))
}

/// Form fields arrive as strings, repeated keys collect into an array
fn form_fields(pairs: Vec<(String, String)>) -> Value {
    let mut object = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match object.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Value::Array(values) => values.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }
    Value::Object(object)
}
