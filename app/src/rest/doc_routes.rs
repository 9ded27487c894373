use mushroom_core::Resource;
use std::sync::Arc;
use utoipa::openapi::path::{
    OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder, PathItemType, PathsBuilder,
};
use utoipa::openapi::request_body::{RequestBody, RequestBodyBuilder};
use utoipa::openapi::schema::{
    ArrayBuilder, ComponentsBuilder, ObjectBuilder, Ref, Schema, SchemaType,
};
use utoipa::openapi::tag::{Tag, TagBuilder};
use utoipa::openapi::{
    ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, RefOr, Required, Response,
    ResponseBuilder, ServerBuilder,
};
use utoipa_swagger_ui::Config;
use warp::Filter;
use warp::{
    http::Uri,
    hyper::{Response as HttpResponse, StatusCode},
    path::{FullPath, Tail},
    Rejection, Reply,
};

const API_TITLE: &str = "Mushroom API's";
const API_VERSION: &str = "1.0.0";
const DEVICES_SCHEMA: &str = "Devices";
const JSON: &str = "application/json";

/// Merges the description of every resource into one document
pub fn api_description(public_url: &str) -> OpenApi {
    let mut tags: Vec<Tag> = Vec::new();
    let mut paths = PathsBuilder::new();
    let components = ComponentsBuilder::new().schema(DEVICES_SCHEMA, devices_schema());

    for spec in Resource::ALL.iter().map(|resource| resource_api(*resource)) {
        for tag in spec.tags.iter() {
            tags.append(&mut tag.clone());
        }
        for (key, value) in spec.paths.paths.iter() {
            paths = paths.path(key, value.clone());
        }
    }

    OpenApiBuilder::new()
        .info(InfoBuilder::new().title(API_TITLE).version(API_VERSION).build())
        .servers(Some(vec![ServerBuilder::new().url(public_url).build()]))
        .tags(Some(tags))
        .paths(paths.build())
        .components(Some(components.build()))
        .build()
}

pub fn swagger(
    api: OpenApi,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let config = Arc::new(Config::new(["/api-doc/api.json"]));

    warp::path!("api-doc" / "api.json")
        .and(warp::get())
        .map(move || warp::reply::json(&api))
        .or(warp::path("api-doc")
            .and(warp::get())
            .and(warp::path::full())
            .and(warp::path::tail())
            .and(warp::any().map(move || config.clone()))
            .and_then(serve_swagger))
}

async fn serve_swagger(
    full_path: FullPath,
    tail: Tail,
    config: Arc<Config<'static>>,
) -> Result<Box<dyn Reply + 'static>, Rejection> {
    if full_path.as_str() == "/api-doc" {
        return Ok(Box::new(warp::redirect::found(Uri::from_static(
            "/api-doc/",
        ))));
    }

    let path = tail.as_str();
    match utoipa_swagger_ui::serve(path, config) {
        Ok(file) => {
            if let Some(file) = file {
                Ok(Box::new(
                    HttpResponse::builder()
                        .header("Content-Type", file.content_type)
                        .body(file.bytes),
                ))
            } else {
                Ok(Box::new(StatusCode::NOT_FOUND))
            }
        }
        Err(error) => Ok(Box::new(
            HttpResponse::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(error.to_string()),
        )),
    }
}

/// The five operations of one resource, grouped under its tag
fn resource_api(resource: Resource) -> OpenApi {
    let label = resource.label();
    let base = format!("/{}", resource.path());

    let get_one = operation(resource, format!("Get a single {} device by name", label))
        .description(Some("Fetch information from the database"))
        .parameter(device_parameter(format!("Name of the {} device to retrieve", label)))
        .response("200", record_response("Returns the device"))
        .response("404", not_found_response())
        .build();
    let get_all = operation(resource, format!("To get all the {} devices", label))
        .description(Some("Fetch information from the database"))
        .response("200", list_response("This API will fetch data from server"))
        .build();
    let create = operation(resource, format!("Add a {} device to the database", label))
        .description(Some("Post information to the database"))
        .request_body(Some(device_body()))
        .response("201", record_response("Successfully added"))
        .response("500", failure_response())
        .build();
    let delete = operation(resource, format!("Delete {} device from the database", label))
        .description(Some("Find and delete data from database"))
        .parameter(device_parameter("Device's Name"))
        .response("200", record_response("Deleted Successfully"))
        .response("404", not_found_response())
        .build();
    let update = operation(resource, "Exchange the information of a device")
        .description(Some("Fetch and update data from database"))
        .parameter(device_parameter("Device's Name"))
        .request_body(Some(device_body()))
        .response("200", record_response("Updated successfully"))
        .response("404", not_found_response())
        .response("500", failure_response())
        .build();

    let paths = PathsBuilder::new()
        .path(
            format!("{}/one/{{device}}", base),
            PathItemBuilder::new()
                .operation(PathItemType::Get, get_one)
                .build(),
        )
        .path(
            format!("{}/devices", base),
            PathItemBuilder::new()
                .operation(PathItemType::Get, get_all)
                .operation(PathItemType::Post, create)
                .build(),
        )
        .path(
            format!("{}/devices/{{device}}", base),
            PathItemBuilder::new()
                .operation(PathItemType::Delete, delete)
                .operation(PathItemType::Put, update)
                .build(),
        );

    let tag = TagBuilder::new()
        .name(resource.tag())
        .description(Some(format!("API endpoints for {} devices", label)))
        .build();

    OpenApiBuilder::new()
        .tags(Some(vec![tag]))
        .paths(paths.build())
        .build()
}

fn operation(resource: Resource, summary: impl Into<String>) -> OperationBuilder {
    OperationBuilder::new()
        .tag(resource.tag())
        .summary(Some(summary))
}

fn device_parameter(description: impl Into<String>) -> ParameterBuilder {
    ParameterBuilder::new()
        .name("device")
        .parameter_in(ParameterIn::Path)
        .required(Required::True)
        .description(Some(description))
        .schema(Some(typed(SchemaType::String)))
}

fn device_body() -> RequestBody {
    RequestBodyBuilder::new()
        .content(
            JSON,
            ContentBuilder::new()
                .schema(Ref::from_schema_name(DEVICES_SCHEMA))
                .build(),
        )
        .required(Some(Required::True))
        .build()
}

fn record_response(description: &str) -> Response {
    ResponseBuilder::new()
        .description(description)
        .content(
            JSON,
            ContentBuilder::new()
                .schema(Ref::from_schema_name(DEVICES_SCHEMA))
                .build(),
        )
        .build()
}

fn list_response(description: &str) -> Response {
    let list = ArrayBuilder::new()
        .items(Ref::from_schema_name(DEVICES_SCHEMA))
        .build();
    ResponseBuilder::new()
        .description(description)
        .content(
            JSON,
            ContentBuilder::new().schema(Schema::Array(list)).build(),
        )
        .build()
}

fn not_found_response() -> Response {
    let message = ObjectBuilder::new()
        .property("message", typed(SchemaType::String))
        .build();
    ResponseBuilder::new()
        .description("Device not found")
        .content(
            JSON,
            ContentBuilder::new().schema(Schema::Object(message)).build(),
        )
        .build()
}

fn failure_response() -> Response {
    ResponseBuilder::new()
        .description("Storage rejected the device")
        .build()
}

fn devices_schema() -> RefOr<Schema> {
    let sensor_data = ArrayBuilder::new().items(typed(SchemaType::Value)).build();
    let devices = ObjectBuilder::new()
        .property("_id", typed(SchemaType::Integer))
        .property("device", typed(SchemaType::String))
        .property("sensorData", Schema::Array(sensor_data))
        .build();
    RefOr::T(Schema::Object(devices))
}

fn typed(schema_type: SchemaType) -> Schema {
    Schema::Object(ObjectBuilder::new().schema_type(schema_type).build())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_description_lists_every_route() {
        let api = api_description("http://localhost:7000");
        let paths = &api.paths.paths;

        for resource in Resource::ALL {
            let base = format!("/{}", resource.path());
            let one = &paths[&format!("{}/one/{{device}}", base)];
            assert!(one.operations.contains_key(&PathItemType::Get));

            let devices = &paths[&format!("{}/devices", base)];
            assert!(devices.operations.contains_key(&PathItemType::Get));
            assert!(devices.operations.contains_key(&PathItemType::Post));

            let named = &paths[&format!("{}/devices/{{device}}", base)];
            assert!(named.operations.contains_key(&PathItemType::Delete));
            assert!(named.operations.contains_key(&PathItemType::Put));
        }
        assert_eq!(6, paths.len());

        let tags: Vec<String> = api
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(|tag| tag.name)
            .collect();
        assert_eq!(vec!["SCD Devices", "Soil Devices"], tags);
    }
}
