//! End-to-end lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and drives `AssetsClient` through
//! a ureq-backed `HttpGateway`. Validates that request shaping and lenient
//! decoding line up with what the server actually sends and accepts.

use std::path::Path;

use assets_core::{
    AssetsClient, AssetsError, BrowseRequest, CheckoutRequest, CopyAssetRequest, CreateFolderRequest, CreateRequest,
    GetFolderRequest, HttpGateway, HttpMethod, LoginRequest, Metadata, Operation, RawResponse, RemoveFolderRequest,
    RemoveRequest, TransportError, TransportParams, UpdateFolderRequest, UpdateRequest,
};
use serde_json::{json, Value};

/// Gateway that talks to the mock server over real HTTP.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses can be turned into coded `TransportError`s here. Uploads are not
/// supported.
struct UreqGateway {
    base: String,
    agent: ureq::Agent,
}

impl UreqGateway {
    fn new(base: &str) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            base: base.to_string(),
            agent,
        }
    }

    fn post_form(&self, endpoint: &str, params: &TransportParams) -> Result<(u16, Vec<u8>), TransportError> {
        if params.has_file() {
            return Err(TransportError::new("file uploads are not supported by this gateway"));
        }
        let fields: Vec<(&str, &str)> = params
            .iter()
            .filter_map(|(key, value)| value.as_text().map(|text| (key, text)))
            .collect();
        let mut response = self
            .agent
            .post(&format!("{}/services/{endpoint}", self.base))
            .send_form(fields)
            .map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok((status, body))
    }
}

fn decode(status: u16, body: &[u8]) -> Result<Value, TransportError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
        return Err(TransportError::with_code(status, message));
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| TransportError::new(e.to_string()))
}

fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl HttpGateway for UreqGateway {
    fn service_request(&self, endpoint: &str, params: &TransportParams) -> Result<Value, TransportError> {
        let (status, body) = self.post_form(endpoint, params)?;
        decode(status, &body)
    }

    fn api_request(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> Result<Value, TransportError> {
        let url = format!("{}/api/{path}", self.base);
        let payload = body.map(Value::to_string).unwrap_or_default();
        let result = match method {
            HttpMethod::Get => {
                let mut request = self.agent.get(&url);
                if let Some(Value::Object(fields)) = body {
                    for (key, value) in fields {
                        request = request.query(key.as_str(), query_text(value).as_str());
                    }
                }
                request.call()
            }
            HttpMethod::Delete => self.agent.delete(&url).call(),
            HttpMethod::Post => self
                .agent
                .post(&url)
                .content_type("application/json")
                .send(payload.as_bytes()),
            HttpMethod::Put => self
                .agent
                .put(&url)
                .content_type("application/json")
                .send(payload.as_bytes()),
        };
        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::new(e.to_string()))?;
        decode(status, &bytes)
    }

    fn raw_service_request(&self, endpoint: &str, params: &TransportParams) -> Result<RawResponse, TransportError> {
        let (status, body) = self.post_form(endpoint, params)?;
        if !(200..300).contains(&status) {
            return decode(status, &body).map(|_| RawResponse::default());
        }
        Ok(RawResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }

    fn download_file_to_path(&self, url: &str, path: &Path) -> Result<(), TransportError> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| TransportError::new(e.to_string()))?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(TransportError::with_code(status, format!("download of {url} failed")));
        }
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::new(e.to_string()))?;
        std::fs::write(path, bytes).map_err(|e| TransportError::new(e.to_string()))
    }
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn metadata(value: Value) -> Metadata {
    value.as_object().cloned().unwrap()
}

#[test]
fn asset_lifecycle() {
    let base = start_server();
    let client = AssetsClient::new(UreqGateway::new(&base));
    let dir = tempfile::tempdir().unwrap();

    // Step 1: login, rejected without a password.
    let session = client.login(&LoginRequest::new("admin", "secret")).unwrap();
    assert!(session.login_success);
    assert!(!session.csrf_token.is_empty());
    let rejected = client.login(&LoginRequest::new("admin", "")).unwrap();
    assert!(!rejected.login_success);
    assert!(!rejected.login_fault_message.is_empty());

    // Step 2: folder round trip.
    let folder = client
        .create_folder(
            &CreateFolderRequest::new("/Demo Zone/Int").with_metadata(metadata(json!({"description": "it"}))),
        )
        .unwrap();
    assert_eq!(folder.name, "Int");
    let fetched = client.get_folder(&GetFolderRequest::new("/Demo Zone/Int")).unwrap();
    assert_eq!(fetched.id, folder.id);
    let updated = client
        .update_folder(&UpdateFolderRequest::new(
            folder.id.as_str(),
            metadata(json!({"description": "changed"})),
        ))
        .unwrap();
    assert_eq!(updated.metadata["description"], "changed");

    // Step 3: create an asset and look it up by id.
    let created = client
        .create(&CreateRequest::new(metadata(json!({
            "assetPath": "/Demo Zone/Int/a.txt",
            "tags": ["x", "y"],
        }))))
        .unwrap();
    assert!(!created.id.is_empty());
    let found = client.search_asset(&created.id, ["assetPath", "tags"]).unwrap();
    assert_eq!(found.asset_path().as_deref(), Some("/Demo Zone/Int/a.txt"));
    assert_eq!(found.metadata["tags"], json!(["x", "y"]));

    // Step 4: an empty list clears the field.
    let cleared = client
        .update(&UpdateRequest::new(created.id.as_str()).with_metadata(metadata(json!({"tags": []}))))
        .unwrap();
    assert!(cleared.metadata.get("tags").is_none());

    // Step 5: collection membership.
    let collection = client
        .create_collection("/Demo Zone/Int/set.collection", Metadata::new())
        .unwrap();
    client.add_to_container(&created.id, &collection.id).unwrap();
    let removed = client.remove_from_container(&created.id, &collection.id).unwrap();
    assert_eq!(removed.processed_count, 1);
    let again = client.remove_from_container(&created.id, &collection.id).unwrap();
    assert_eq!(again.processed_count, 0);

    // Step 6: checkout and downloads.
    let checkout = client.checkout(&CheckoutRequest::new(created.id.as_str())).unwrap();
    assert_eq!(checkout.checked_out_by, "admin");
    assert!(checkout.checked_out > 0);

    let checked_out_copy = dir.path().join("checkout.txt");
    client
        .checkout_and_download(&CheckoutRequest::new(created.id.as_str()), &checked_out_copy)
        .unwrap();
    assert_eq!(std::fs::read_to_string(&checked_out_copy).unwrap(), "content of /Demo Zone/Int/a.txt");

    let original = dir.path().join("original.txt");
    client.download_original_file(&found, &original).unwrap();
    assert_eq!(std::fs::read_to_string(&original).unwrap(), "content of /Demo Zone/Int/a.txt");

    // Step 7: copy, then find the copy by query.
    let copied = client
        .copy_asset(&CopyAssetRequest::new("/Demo Zone/Int/a.txt", "/Demo Zone/Int/b.txt"))
        .unwrap();
    assert_eq!(copied.processed_count, 1);
    let copy_id = client.search_asset_id("name:b.txt", true).unwrap();
    assert_ne!(copy_id, created.id);
    let browse = client.browse(&BrowseRequest::new("/Demo Zone/Int")).unwrap();
    assert_eq!(browse.items.len(), 3);
    assert_eq!(browse.folders().count(), 0);

    // Step 8: server errors keep their status code.
    let err = client
        .update(&UpdateRequest::new("missing").with_metadata(metadata(json!({"x": "1"}))))
        .unwrap_err();
    assert_eq!(err.operation(), Operation::Update);
    assert_eq!(err.code(), Some(404));

    // Step 9: removing the folder path takes its assets with it.
    let gone = client.remove(&RemoveRequest::by_folder_path("/Demo Zone/Int")).unwrap();
    assert!(gone.processed_count >= 3);
    let err = client.search_asset(&created.id, Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, AssetsError::NotFound { .. }));
    let err = client.get_folder(&GetFolderRequest::new("/Demo Zone/Int")).unwrap_err();
    assert_eq!(err.code(), Some(404));
}

#[test]
fn remove_folder_by_id() {
    let base = start_server();
    let client = AssetsClient::new(UreqGateway::new(&base));

    let folder = client.create_folder(&CreateFolderRequest::new("/Tmp")).unwrap();
    client.remove_folder(&RemoveFolderRequest::new(folder.id.as_str())).unwrap();
    let err = client.get_folder(&GetFolderRequest::new("/Tmp")).unwrap_err();
    assert_eq!(err.operation(), Operation::GetFolder);
    assert_eq!(err.code(), Some(404));
}
