//! Transport seam for the host-does-IO pattern.
//!
//! # Design
//! The core never opens a socket. It shapes requests into the plain data
//! types below and hands them to an [`HttpGateway`] supplied by the caller.
//! The gateway owns connections, authentication, CSRF tokens, multipart
//! encoding and retries, and reports failures as [`TransportError`].
//!
//! Legacy `services/*` endpoints take a flat form: [`TransportParams`] maps
//! each field name to text or to a [`FileHandle`]. The path-based folder API
//! takes an optional JSON body instead.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::TransportError;

/// HTTP method for a path-based API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local file to upload with a service request.
///
/// Only the path is held; the gateway opens the file for the duration of the
/// call that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileHandle {
    pub path: PathBuf,
    /// Name sent to the server; falls back to the path's file name.
    pub file_name: Option<String>,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// A handle without a path carries no payload and is never sent.
    pub fn is_empty(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    pub fn upload_name(&self) -> Option<String> {
        self.file_name.clone().or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
    }
}

/// One value of a form-encoded service request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    File(FileHandle),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(text) => Some(text),
            ParamValue::File(_) => None,
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Text(if value { "true" } else { "false" }.to_string())
    }
}

impl From<FileHandle> for ParamValue {
    fn from(value: FileHandle) -> Self {
        ParamValue::File(value)
    }
}

/// The flat parameter map a service endpoint expects, in stable key order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportParams(BTreeMap<String, ParamValue>);

impl TransportParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Insert `value` only when it is non-empty.
    pub fn insert_non_empty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// The text value of `key`, or `None` when absent or a file.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn has_file(&self) -> bool {
        self.0.values().any(|v| matches!(v, ParamValue::File(_)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render the parameters as `k=v` pairs for log records. Files are shown
    /// by path; passwords are masked.
    pub fn describe(&self) -> String {
        self.iter()
            .map(|(k, v)| match v {
                ParamValue::Text(_) if k == "password" => format!("{k}=<redacted>"),
                ParamValue::Text(text) => format!("{k}={text}"),
                ParamValue::File(file) => format!("{k}=<file {}>", file.path.display()),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A response whose body is kept as raw bytes, used for binary downloads.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// The transport collaborator the client drives.
///
/// Implementations perform the actual I/O. JSON-returning calls hand back
/// the decoded body; a non-success status must surface as `Err`.
pub trait HttpGateway {
    /// POST `params` to the legacy service endpoint `endpoint` (e.g.
    /// `"search"`), multipart when a [`ParamValue::File`] is present.
    fn service_request(&self, endpoint: &str, params: &TransportParams) -> Result<Value, TransportError>;

    /// Call the path-based API (e.g. `"folder/get"`) with an optional JSON
    /// body. For `GET`, gateways send the body's fields as query parameters.
    fn api_request(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> Result<Value, TransportError>;

    /// Like `service_request` but without JSON decoding.
    fn raw_service_request(&self, endpoint: &str, params: &TransportParams) -> Result<RawResponse, TransportError>;

    /// Fetch `url` and write its content to `path`.
    fn download_file_to_path(&self, url: &str, path: &Path) -> Result<(), TransportError>;

    fn write_response_body_to_path(&self, response: &RawResponse, path: &Path) -> Result<(), TransportError> {
        std::fs::write(path, &response.body)
            .map_err(|e| TransportError::new(format!("writing {} failed: {e}", path.display())))
    }
}

impl<G: HttpGateway + ?Sized> HttpGateway for &G {
    fn service_request(&self, endpoint: &str, params: &TransportParams) -> Result<Value, TransportError> {
        (**self).service_request(endpoint, params)
    }

    fn api_request(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> Result<Value, TransportError> {
        (**self).api_request(method, path, body)
    }

    fn raw_service_request(&self, endpoint: &str, params: &TransportParams) -> Result<RawResponse, TransportError> {
        (**self).raw_service_request(endpoint, params)
    }

    fn download_file_to_path(&self, url: &str, path: &Path) -> Result<(), TransportError> {
        (**self).download_file_to_path(url, path)
    }

    fn write_response_body_to_path(&self, response: &RawResponse, path: &Path) -> Result<(), TransportError> {
        (**self).write_response_body_to_path(response, path)
    }
}
