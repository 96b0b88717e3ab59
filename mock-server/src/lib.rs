//! In-memory stand-in for an Assets server.
//!
//! Speaks the form-encoded `services/*` endpoints and the JSON folder API
//! closely enough to drive the client end to end. Uploads are not parsed:
//! created assets get placeholder content derived from their path.

pub mod query;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query as UrlQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

use crate::query::Query;
use crate::store::{Asset, Failure, Folder, Hit, Relation, Store, COLLECTION_EXTENSION};

pub type Db = Arc<RwLock<Store>>;

type Params = HashMap<String, String>;

const DEFAULT_NUM: usize = 50;
const PERMISSIONS: &str = "VPUMERXC";

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({ "errorcode": self.status, "message": self.message });
        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
pub struct CreateFolder {
    pub path: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct UpdateFolder {
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/services/login", post(login))
        .route("/services/search", post(search))
        .route("/services/browse", post(browse))
        .route("/services/create", post(create))
        .route("/services/update", post(update))
        .route("/services/updatebulk", post(update_bulk))
        .route("/services/checkout", post(checkout))
        .route("/services/copy", post(copy))
        .route("/services/move", post(move_asset))
        .route("/services/remove", post(remove))
        .route("/services/createRelation", post(create_relation))
        .route("/services/removeRelation", post(remove_relation))
        .route("/api/folder/get", get(get_folder))
        .route("/api/folder", post(create_folder))
        .route("/api/folder/{id}", put(update_folder).delete(remove_folder))
        .route("/file/{id}", get(download_file))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn text<'a>(params: &'a Params, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or("")
}

fn required<'a>(params: &'a Params, key: &str) -> Result<&'a str, Failure> {
    let value = text(params, key);
    if value.is_empty() {
        return Err(Failure::bad_request(format!("{key} is required")));
    }
    Ok(value)
}

/// Missing flags take `default`; anything but `"true"` is false.
fn flag(params: &Params, key: &str, default: bool) -> bool {
    params.get(key).map_or(default, |v| v == "true")
}

fn list(params: &Params, key: &str) -> Vec<String> {
    text(params, key)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn metadata_param(params: &Params) -> Result<Map<String, Value>, Failure> {
    match params.get("metadata").filter(|m| !m.is_empty()) {
        None => Ok(Map::new()),
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(Failure::bad_request("metadata must be a JSON object")),
        },
    }
}

fn host(headers: &HeaderMap) -> &str {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost")
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn process(processed: i64, errors: i64) -> Json<Value> {
    Json(json!({ "processedCount": processed, "errorCount": errors }))
}

fn asset_json(asset: &Asset, host: &str, fields: &[String]) -> Value {
    let metadata: Map<String, Value> = if fields.is_empty() {
        asset.metadata.clone()
    } else {
        asset
            .metadata
            .iter()
            .filter(|(k, _)| fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    };
    json!({
        "id": asset.id,
        "permissions": PERMISSIONS,
        "originalUrl": format!("http://{host}/file/{}", asset.id),
        "thumbnailUrl": format!("http://{host}/thumbnail/{}", asset.id),
        "metadata": metadata,
    })
}

fn hit_json(hit: &Hit<'_>, host: &str, fields: &[String]) -> Value {
    let mut value = asset_json(hit.asset, host, fields);
    if let Some(relation) = hit.relation {
        value["relation"] = relation_json(relation);
    }
    value
}

fn relation_json(relation: &Relation) -> Value {
    serde_json::to_value(relation).unwrap_or(Value::Null)
}

fn folder_json(folder: &Folder) -> Value {
    serde_json::to_value(folder).unwrap_or(Value::Null)
}

fn placeholder_content(metadata: &Map<String, Value>) -> Vec<u8> {
    let path = metadata.get("assetPath").and_then(Value::as_str).unwrap_or("");
    format!("content of {path}").into_bytes()
}

async fn login(Form(params): Form<Params>) -> Json<Value> {
    let username = text(&params, "username");
    if username.is_empty() || text(&params, "password").is_empty() {
        return Json(json!({
            "loginSuccess": false,
            "loginFaultMessage": "Invalid username or password",
        }));
    }
    tracing::debug!(username, "login");
    Json(json!({
        "loginSuccess": true,
        "serverVersion": "6.90.0",
        "csrfToken": uuid::Uuid::new_v4().simple().to_string(),
        "authToken": uuid::Uuid::new_v4().simple().to_string(),
    }))
}

async fn search(State(db): State<Db>, headers: HeaderMap, Form(params): Form<Params>) -> Json<Value> {
    let store = db.read().await;
    let query = Query::parse(text(&params, "q"));
    let start = text(&params, "start").parse::<usize>().unwrap_or(0);
    let num = text(&params, "num").parse::<usize>().unwrap_or(DEFAULT_NUM);
    let fields = list(&params, "metadataToReturn");
    let hits = store.search(&query);
    let host = host(&headers);
    let page: Vec<Value> = hits
        .iter()
        .skip(start)
        .take(num)
        .map(|hit| hit_json(hit, host, &fields))
        .collect();
    Json(json!({
        "firstResult": start,
        "maxResultHits": num,
        "totalHits": hits.len(),
        "hits": page,
        "facets": {},
    }))
}

async fn browse(State(db): State<Db>, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let path = required(&params, "path")?;
    let store = db.read().await;
    let (folders, assets) = store.browse(path);
    let mut items = Vec::new();
    if flag(&params, "includeFolders", true) {
        items.extend(folders.iter().map(|f| {
            json!({ "name": f.name, "assetPath": f.path, "directory": true, "permissions": f.permissions })
        }));
    }
    if flag(&params, "includeAsset", true) {
        items.extend(assets.iter().map(|a| {
            let path = a.asset_path();
            json!({
                "name": a.metadata.get("name").cloned().unwrap_or(Value::Null),
                "assetPath": path,
                "directory": false,
                "collection": path.ends_with(COLLECTION_EXTENSION),
                "permissions": PERMISSIONS,
            })
        }));
    }
    Ok(Json(Value::Array(items)))
}

async fn create(State(db): State<Db>, headers: HeaderMap, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let metadata = metadata_param(&params)?;
    let content = placeholder_content(&metadata);
    let mut store = db.write().await;
    let asset = store.create_asset(metadata, content)?;
    tracing::info!(id = %asset.id, path = asset.asset_path(), "created asset");
    Ok(Json(asset_json(asset, host(&headers), &list(&params, "metadataToReturn"))))
}

async fn update(State(db): State<Db>, headers: HeaderMap, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let id = required(&params, "id")?;
    let metadata = metadata_param(&params)?;
    let clear_checkout = flag(&params, "clearCheckoutState", false);
    let mut store = db.write().await;
    let asset = store.update_asset(id, &metadata, clear_checkout)?;
    tracing::info!(id, "updated asset");
    Ok(Json(asset_json(asset, host(&headers), &list(&params, "metadataToReturn"))))
}

async fn update_bulk(State(db): State<Db>, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let q = required(&params, "q")?;
    let metadata = metadata_param(&params)?;
    let processed = db.write().await.update_bulk(&Query::parse(q), &metadata);
    Ok(process(processed as i64, 0))
}

async fn checkout(State(db): State<Db>, Form(params): Form<Params>) -> Result<Response, Failure> {
    let id = required(&params, "id")?;
    let mut store = db.write().await;
    let asset = store.checkout(id, "admin", now_ms())?;
    if flag(&params, "download", false) {
        let headers = [(header::CONTENT_TYPE, "application/octet-stream")];
        return Ok((headers, asset.content.clone()).into_response());
    }
    let (checked_out, by) = asset.checked_out.clone().unwrap_or_default();
    Ok(Json(json!({
        "checkedOut": checked_out,
        "checkedOutBy": by,
        "checkedOutOnClient": "api",
    }))
    .into_response())
}

async fn copy(State(db): State<Db>, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let source = required(&params, "source")?;
    let target = required(&params, "target")?;
    let policy = text(&params, "fileReplacePolicy");
    let (processed, errors) = db.write().await.copy(source, target, policy)?;
    Ok(process(processed, errors))
}

async fn move_asset(State(db): State<Db>, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let source = required(&params, "source")?;
    let target = required(&params, "target")?;
    let policy = text(&params, "fileReplacePolicy");
    let moved = db.write().await.move_path(source, target, policy)?;
    Ok(process(moved, 0))
}

async fn remove(State(db): State<Db>, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let q = text(&params, "q");
    let ids = list(&params, "ids");
    let folder_path = text(&params, "folderPath");
    if q.is_empty() && ids.is_empty() && folder_path.is_empty() {
        return Err(Failure::bad_request("one of q, ids or folderPath is required"));
    }
    let mut store = db.write().await;
    let mut removed = 0;
    if !q.is_empty() {
        let matched: Vec<String> = store
            .search(&Query::parse(q))
            .iter()
            .map(|hit| hit.asset.id.clone())
            .collect();
        removed += store.remove_assets(&matched);
    }
    removed += store.remove_assets(&ids);
    if !folder_path.is_empty() {
        removed += store.remove_folder_path(folder_path);
    }
    tracing::info!(removed, "removed");
    Ok(process(removed, 0))
}

async fn create_relation(State(db): State<Db>, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let relation_type = required(&params, "relationType")?;
    let target1 = required(&params, "target1Id")?;
    let target2 = required(&params, "target2Id")?;
    db.write().await.create_relation(relation_type, target1, target2)?;
    Ok(Json(json!({})))
}

async fn remove_relation(State(db): State<Db>, Form(params): Form<Params>) -> Result<Json<Value>, Failure> {
    let ids = list(&params, "relationIds");
    if ids.is_empty() {
        return Err(Failure::bad_request("relationIds is required"));
    }
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    let (processed, errors) = db.write().await.remove_relations(&ids);
    Ok(process(processed, errors))
}

async fn get_folder(State(db): State<Db>, UrlQuery(params): UrlQuery<Params>) -> Result<Json<Value>, Failure> {
    let path = required(&params, "path")?;
    let store = db.read().await;
    Ok(Json(folder_json(store.folder_by_path(path)?)))
}

async fn create_folder(State(db): State<Db>, Json(input): Json<CreateFolder>) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let folder = store.create_folder(&input.path, &input.metadata)?;
    tracing::info!(id = %folder.id, path = %folder.path, "created folder");
    Ok(Json(folder_json(folder)))
}

async fn update_folder(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<UpdateFolder>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    Ok(Json(folder_json(store.update_folder(&id, &input.metadata)?)))
}

async fn remove_folder(State(db): State<Db>, Path(id): Path<String>) -> Result<StatusCode, Failure> {
    db.write().await.remove_folder(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_file(State(db): State<Db>, Path(id): Path<String>) -> Result<Vec<u8>, Failure> {
    let store = db.read().await;
    Ok(store.asset(&id)?.content.clone())
}
