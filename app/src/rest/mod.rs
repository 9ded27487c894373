use crate::config::Config;
use crate::error::{RequestError, StartupError, StoreError};
use crate::models::DeviceStores;
use mushroom_core::Resource;
use serde::Serialize;
use std::convert::Infallible;
use tracing::{debug, error, info, warn};
use warp::http::header::{self, HeaderMap, HeaderValue};
use warp::http::{Method, StatusCode};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

mod device_routes;
mod doc_routes;

/// Bodies above this size are rejected with 413
pub const BODY_LIMIT: u64 = 100 * 1024;

const DEVICE_NOT_FOUND: &str = "Device not found";

pub fn routes(
    stores: &DeviceStores,
    public_url: &str,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let api = device_routes::routes(Resource::Scd, stores.get(Resource::Scd))
        .or(device_routes::routes(Resource::Soil, stores.get(Resource::Soil)))
        .or(doc_routes::swagger(doc_routes::api_description(public_url)));

    preflight()
        .or(api)
        .recover(handle_rejection)
        .with(warp::reply::with::headers(cors_headers()))
        .with(warp::trace::request())
}

/// Serves until ctrl-c, then stops accepting connections
pub async fn dispatch_server(config: &Config, stores: DeviceStores) -> Result<(), StartupError> {
    let routes = routes(&stores, config.public_url());
    let (addr, server) = warp::serve(routes).try_bind_with_graceful_shutdown(
        config.bind_addr(),
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed listening for ctrl-c: {}", e);
            }
        },
    )?;

    info!("Starting webserver at: {}", addr);
    server.await;
    info!("Webserver stopped");
    Ok(())
}

/// Answers OPTIONS on any path, other methods fall through as not found
fn preflight() -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::method().and_then(|method: Method| async move {
        if method == Method::OPTIONS {
            Ok(warp::reply().into_response())
        } else {
            Err(warp::reject::not_found())
        }
    })
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept"),
    );
    headers
}

fn build_response<T: Serialize>(
    resp: Result<T, StoreError>,
    status: StatusCode,
) -> Result<Response, Rejection> {
    match resp {
        Ok(body) => {
            Ok(warp::reply::with_status(warp::reply::json(&body), status).into_response())
        }
        Err(err) => {
            error!("{}", err);
            Ok(plain_status(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

/// Absent records become 404, everything else goes through `build_response`
fn found_or_404<T: Serialize>(resp: Result<Option<T>, StoreError>) -> Result<Response, Rejection> {
    match resp {
        Ok(Some(found)) => build_response(Ok(found), StatusCode::OK),
        Ok(None) => {
            let body = dto::MessageDto {
                message: DEVICE_NOT_FOUND.to_owned(),
            };
            Ok(
                warp::reply::with_status(warp::reply::json(&body), StatusCode::NOT_FOUND)
                    .into_response(),
            )
        }
        Err(err) => build_response::<T>(Err(err), StatusCode::OK),
    }
}

fn plain_status(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or_default();
    warp::reply::with_status(reason, status).into_response()
}

/// Body rejections only occur once path and method matched, so they win
/// over the method mismatches of sibling routes
async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if let Some(request_err) = err.find::<RequestError>() {
        debug!("Rejected request: {}", request_err);
        match request_err {
            RequestError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RequestError::MalformedBody(_) | RequestError::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        StatusCode::PAYLOAD_TOO_LARGE
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        StatusCode::LENGTH_REQUIRED
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    } else if err.find::<warp::body::BodyDeserializeError>().is_some() {
        StatusCode::BAD_REQUEST
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        StatusCode::METHOD_NOT_ALLOWED
    } else if err.find::<warp::reject::InvalidHeader>().is_some()
        || err.find::<warp::reject::MissingHeader>().is_some()
        || err.find::<warp::reject::InvalidQuery>().is_some()
    {
        StatusCode::BAD_REQUEST
    } else {
        warn!("Unhandled rejection: {:?}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok(plain_status(status))
}

///
/// DTO
///
pub mod dto {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MessageDto {
        pub message: String,
    }
}
