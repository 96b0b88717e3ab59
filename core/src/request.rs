//! Request values for every client operation.
//!
//! # Design
//! Requests are built by value: a constructor takes the required fields and
//! consuming `with_*` setters fill in the optional ones. A request is handed
//! to the client once and never mutated afterwards.
//!
//! Legacy service requests implement [`ServiceRequest`] and flatten into the
//! form map the endpoint expects:
//! - booleans become the literal strings `"true"` / `"false"`;
//! - id lists and field lists are comma-joined;
//! - metadata is JSON-encoded after [`encode_metadata`] normalization;
//! - a file is sent only when a non-empty [`FileHandle`] is attached.
//!
//! Folder requests implement [`ApiRequest`] and produce a method, a path
//! under the folder API root and an optional JSON body.

use std::fmt;

use serde_json::{json, Value};

use crate::config::{Endpoints, ProtocolConfig};
use crate::error::{AssetsError, Operation};
use crate::http::{FileHandle, HttpMethod, TransportParams};
use crate::metadata::{encode_metadata, normalize_metadata, Metadata};

/// Form field carrying an uploaded file.
pub const FILE_FIELD: &str = "Filedata";

/// A request against a legacy `services/*` endpoint.
pub trait ServiceRequest {
    const OPERATION: Operation;

    fn endpoint(endpoints: &Endpoints) -> &str;

    /// Flatten into the endpoint's form parameters, rejecting empty required
    /// identifiers.
    fn to_transport_params(&self) -> Result<TransportParams, AssetsError>;

    /// Identifiers for log records and error messages.
    fn context(&self) -> String;
}

/// A request against the path-based folder API.
pub trait ApiRequest {
    const OPERATION: Operation;

    fn method(&self) -> HttpMethod;

    /// Path relative to the API root, rejecting empty identifiers.
    fn api_path(&self, protocol: &ProtocolConfig) -> Result<String, AssetsError>;

    fn to_api_body(&self) -> Option<Value>;

    fn context(&self) -> String;
}

/// What to do when a copy or move hits an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileReplacePolicy {
    #[default]
    AutoRename,
    Overwrite,
    OverwriteIfNewer,
    RemoveSource,
    ThrowException,
    DoNothing,
}

impl FileReplacePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FileReplacePolicy::AutoRename => "AUTO_RENAME",
            FileReplacePolicy::Overwrite => "OVERWRITE",
            FileReplacePolicy::OverwriteIfNewer => "OVERWRITE_IF_NEWER",
            FileReplacePolicy::RemoveSource => "REMOVE_SOURCE",
            FileReplacePolicy::ThrowException => "THROW_EXCEPTION",
            FileReplacePolicy::DoNothing => "DO_NOTHING",
        }
    }
}

/// What to do when a move hits an existing folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderReplacePolicy {
    #[default]
    AutoRename,
    Merge,
    ThrowException,
}

impl FolderReplacePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FolderReplacePolicy::AutoRename => "AUTO_RENAME",
            FolderReplacePolicy::Merge => "MERGE",
            FolderReplacePolicy::ThrowException => "THROW_EXCEPTION",
        }
    }
}

fn require(operation: Operation, field: &str, value: &str) -> Result<(), AssetsError> {
    if value.trim().is_empty() {
        return Err(AssetsError::validation(operation, format!("{field} is empty")));
    }
    Ok(())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Comma-join `values`, skipping blank entries; nothing is sent when all are blank.
fn insert_list(params: &mut TransportParams, key: &str, values: &[String]) {
    let joined = values
        .iter()
        .filter(|v| !is_blank(v))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");
    params.insert_non_empty(key, &joined);
}

fn encode(operation: Operation, metadata: &Metadata) -> Result<String, AssetsError> {
    encode_metadata(metadata).map_err(|e| AssetsError::serialization(operation, e))
}

fn insert_metadata(operation: Operation, params: &mut TransportParams, metadata: &Metadata) -> Result<(), AssetsError> {
    if !metadata.is_empty() {
        params.insert("metadata", encode(operation, metadata)?);
    }
    Ok(())
}

/// Attach `file` if present and non-empty; reports whether it was attached.
fn insert_file(params: &mut TransportParams, file: Option<&FileHandle>) -> bool {
    match file {
        Some(file) if !file.is_empty() => {
            params.insert(FILE_FIELD, file.clone());
            true
        }
        _ => false,
    }
}

fn owned_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

// ---------------------------------------------------------------------------
// Search / browse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub q: String,
    pub start: Option<u32>,
    pub num: Option<u32>,
    pub sort: Option<String>,
    pub metadata_to_return: Vec<String>,
    pub facets: Vec<String>,
    pub append_request_secret: bool,
    pub return_highlighted_text: bool,
    pub return_thumbnail_hits: bool,
    pub log_search: bool,
}

impl SearchRequest {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            start: None,
            num: None,
            sort: None,
            metadata_to_return: Vec::new(),
            facets: Vec::new(),
            append_request_secret: false,
            return_highlighted_text: true,
            return_thumbnail_hits: false,
            log_search: true,
        }
    }

    pub fn with_start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_num(mut self, num: u32) -> Self {
        self.num = Some(num);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_metadata_to_return<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_to_return = owned_list(fields);
        self
    }

    pub fn with_facets<I, S>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets = owned_list(facets);
        self
    }

    pub fn with_append_request_secret(mut self, append: bool) -> Self {
        self.append_request_secret = append;
        self
    }

    pub fn with_return_highlighted_text(mut self, highlight: bool) -> Self {
        self.return_highlighted_text = highlight;
        self
    }

    pub fn with_return_thumbnail_hits(mut self, thumbnails: bool) -> Self {
        self.return_thumbnail_hits = thumbnails;
        self
    }

    pub fn with_log_search(mut self, log_search: bool) -> Self {
        self.log_search = log_search;
        self
    }
}

impl ServiceRequest for SearchRequest {
    const OPERATION: Operation = Operation::Search;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.search
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        let mut params = TransportParams::new();
        params.insert("q", self.q.as_str());
        if let Some(start) = self.start {
            params.insert("start", start.to_string());
        }
        if let Some(num) = self.num {
            params.insert("num", num.to_string());
        }
        if let Some(sort) = &self.sort {
            params.insert_non_empty("sort", sort);
        }
        insert_list(&mut params, "metadataToReturn", &self.metadata_to_return);
        insert_list(&mut params, "facets", &self.facets);
        params.insert("appendRequestSecret", self.append_request_secret);
        params.insert("returnHighlightedText", self.return_highlighted_text);
        params.insert("returnThumbnailHits", self.return_thumbnail_hits);
        params.insert("logSearch", self.log_search);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("q={}", self.q)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseRequest {
    pub path: String,
    pub from_root: Option<String>,
    pub include_folders: bool,
    pub include_asset: bool,
    pub include_extensions: Vec<String>,
}

impl BrowseRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from_root: None,
            include_folders: true,
            include_asset: true,
            include_extensions: Vec::new(),
        }
    }

    pub fn with_from_root(mut self, from_root: impl Into<String>) -> Self {
        self.from_root = Some(from_root.into());
        self
    }

    pub fn with_include_folders(mut self, include: bool) -> Self {
        self.include_folders = include;
        self
    }

    pub fn with_include_asset(mut self, include: bool) -> Self {
        self.include_asset = include;
        self
    }

    pub fn with_include_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_extensions = owned_list(extensions);
        self
    }
}

impl ServiceRequest for BrowseRequest {
    const OPERATION: Operation = Operation::Browse;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.browse
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        let mut params = TransportParams::new();
        params.insert("path", self.path.as_str());
        if let Some(from_root) = &self.from_root {
            params.insert_non_empty("fromRoot", from_root);
        }
        params.insert("includeFolders", self.include_folders);
        params.insert("includeAsset", self.include_asset);
        insert_list(&mut params, "includeExtensions", &self.include_extensions);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("path={}", self.path)
    }
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateRequest {
    pub file: Option<FileHandle>,
    pub metadata: Metadata,
    pub metadata_to_return: Vec<String>,
    pub auto_rename: bool,
    pub parse_metadata_modifications: bool,
}

impl CreateRequest {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: FileHandle) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_metadata_to_return<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_to_return = owned_list(fields);
        self
    }

    pub fn with_auto_rename(mut self, auto_rename: bool) -> Self {
        self.auto_rename = auto_rename;
        self
    }

    pub fn with_parse_metadata_modifications(mut self, parse: bool) -> Self {
        self.parse_metadata_modifications = parse;
        self
    }

    fn asset_path(&self) -> &str {
        self.metadata.get("assetPath").and_then(Value::as_str).unwrap_or("")
    }
}

impl ServiceRequest for CreateRequest {
    const OPERATION: Operation = Operation::Create;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.create
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        let mut params = TransportParams::new();
        insert_file(&mut params, self.file.as_ref());
        insert_metadata(Self::OPERATION, &mut params, &self.metadata)?;
        insert_list(&mut params, "metadataToReturn", &self.metadata_to_return);
        params.insert("autoRename", self.auto_rename);
        params.insert("parseMetadataModifications", self.parse_metadata_modifications);
        Ok(params)
    }

    fn context(&self) -> String {
        match &self.file {
            Some(file) if !file.is_empty() => {
                format!("assetPath={}, file={}", self.asset_path(), file.path.display())
            }
            _ => format!("assetPath={}", self.asset_path()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub id: String,
    pub file: Option<FileHandle>,
    pub metadata: Metadata,
    pub metadata_to_return: Vec<String>,
    pub parse_metadata_modifications: bool,
    /// Only sent together with a file.
    pub clear_checkout_state: bool,
}

impl UpdateRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: None,
            metadata: Metadata::new(),
            metadata_to_return: Vec::new(),
            parse_metadata_modifications: false,
            clear_checkout_state: true,
        }
    }

    pub fn with_file(mut self, file: FileHandle) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_metadata_to_return<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_to_return = owned_list(fields);
        self
    }

    pub fn with_parse_metadata_modifications(mut self, parse: bool) -> Self {
        self.parse_metadata_modifications = parse;
        self
    }

    pub fn with_clear_checkout_state(mut self, clear: bool) -> Self {
        self.clear_checkout_state = clear;
        self
    }
}

impl ServiceRequest for UpdateRequest {
    const OPERATION: Operation = Operation::Update;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.update
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        require(Self::OPERATION, "asset id", &self.id)?;
        let mut params = TransportParams::new();
        params.insert("id", self.id.as_str());
        if insert_file(&mut params, self.file.as_ref()) {
            params.insert("clearCheckoutState", self.clear_checkout_state);
        }
        insert_metadata(Self::OPERATION, &mut params, &self.metadata)?;
        insert_list(&mut params, "metadataToReturn", &self.metadata_to_return);
        params.insert("parseMetadataModifications", self.parse_metadata_modifications);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("id={}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateBulkRequest {
    pub q: String,
    pub metadata: Metadata,
    pub run_async: bool,
    pub parse_metadata_modifications: bool,
}

impl UpdateBulkRequest {
    pub fn new(q: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            q: q.into(),
            metadata,
            run_async: false,
            parse_metadata_modifications: false,
        }
    }

    pub fn with_async(mut self, run_async: bool) -> Self {
        self.run_async = run_async;
        self
    }

    pub fn with_parse_metadata_modifications(mut self, parse: bool) -> Self {
        self.parse_metadata_modifications = parse;
        self
    }
}

impl ServiceRequest for UpdateBulkRequest {
    const OPERATION: Operation = Operation::UpdateBulk;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.update_bulk
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        require(Self::OPERATION, "query", &self.q)?;
        let mut params = TransportParams::new();
        params.insert("q", self.q.as_str());
        params.insert("metadata", encode(Self::OPERATION, &self.metadata)?);
        params.insert("async", self.run_async);
        params.insert("parseMetadataModifications", self.parse_metadata_modifications);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("q={}", self.q)
    }
}

// ---------------------------------------------------------------------------
// Checkout / copy / move / remove
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub id: String,
    /// Overridden by the client: `checkout` forces it off,
    /// `checkout_and_download` forces it on.
    pub download: bool,
}

impl CheckoutRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            download: false,
        }
    }

    pub(crate) fn forcing_download(&self, download: bool) -> Self {
        Self {
            id: self.id.clone(),
            download,
        }
    }
}

impl ServiceRequest for CheckoutRequest {
    const OPERATION: Operation = Operation::Checkout;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.checkout
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        require(Self::OPERATION, "asset id", &self.id)?;
        let mut params = TransportParams::new();
        params.insert("id", self.id.as_str());
        params.insert("download", self.download);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("id={}, download={}", self.id, self.download)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyAssetRequest {
    pub source: String,
    pub target: String,
    pub file_replace_policy: FileReplacePolicy,
    pub run_async: bool,
}

impl CopyAssetRequest {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            file_replace_policy: FileReplacePolicy::default(),
            run_async: false,
        }
    }

    pub fn with_file_replace_policy(mut self, policy: FileReplacePolicy) -> Self {
        self.file_replace_policy = policy;
        self
    }

    pub fn with_async(mut self, run_async: bool) -> Self {
        self.run_async = run_async;
        self
    }
}

impl ServiceRequest for CopyAssetRequest {
    const OPERATION: Operation = Operation::CopyAsset;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.copy
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        require(Self::OPERATION, "source", &self.source)?;
        require(Self::OPERATION, "target", &self.target)?;
        let mut params = TransportParams::new();
        params.insert("source", self.source.as_str());
        params.insert("target", self.target.as_str());
        params.insert("fileReplacePolicy", self.file_replace_policy.as_str());
        params.insert("async", self.run_async);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("source={}, target={}", self.source, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub source: String,
    pub target: String,
    pub folder_replace_policy: FolderReplacePolicy,
    pub file_replace_policy: FileReplacePolicy,
    pub filter_query: Option<String>,
    pub flatten_folders: bool,
    pub run_async: bool,
}

impl MoveRequest {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            folder_replace_policy: FolderReplacePolicy::default(),
            file_replace_policy: FileReplacePolicy::default(),
            filter_query: None,
            flatten_folders: false,
            run_async: false,
        }
    }

    pub fn with_folder_replace_policy(mut self, policy: FolderReplacePolicy) -> Self {
        self.folder_replace_policy = policy;
        self
    }

    pub fn with_file_replace_policy(mut self, policy: FileReplacePolicy) -> Self {
        self.file_replace_policy = policy;
        self
    }

    pub fn with_filter_query(mut self, q: impl Into<String>) -> Self {
        self.filter_query = Some(q.into());
        self
    }

    pub fn with_flatten_folders(mut self, flatten: bool) -> Self {
        self.flatten_folders = flatten;
        self
    }

    pub fn with_async(mut self, run_async: bool) -> Self {
        self.run_async = run_async;
        self
    }
}

impl ServiceRequest for MoveRequest {
    const OPERATION: Operation = Operation::Move;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.move_
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        require(Self::OPERATION, "source", &self.source)?;
        require(Self::OPERATION, "target", &self.target)?;
        let mut params = TransportParams::new();
        params.insert("source", self.source.as_str());
        params.insert("target", self.target.as_str());
        params.insert("folderReplacePolicy", self.folder_replace_policy.as_str());
        params.insert("fileReplacePolicy", self.file_replace_policy.as_str());
        if let Some(filter) = &self.filter_query {
            params.insert_non_empty("filterQuery", filter);
        }
        params.insert("flattenFolders", self.flatten_folders);
        params.insert("async", self.run_async);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("source={}, target={}", self.source, self.target)
    }
}

/// Removes assets matching `q`, the assets in `ids`, or the folder at
/// `folder_path`. Empty selectors are left out of the request so that a
/// folder path removes the folder itself, not only its contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoveRequest {
    pub q: String,
    pub ids: Vec<String>,
    pub folder_path: String,
    pub run_async: bool,
}

impl RemoveRequest {
    pub fn by_query(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: owned_list(ids),
            ..Self::default()
        }
    }

    pub fn by_folder_path(folder_path: impl Into<String>) -> Self {
        Self {
            folder_path: folder_path.into(),
            ..Self::default()
        }
    }

    pub fn with_async(mut self, run_async: bool) -> Self {
        self.run_async = run_async;
        self
    }

    /// True when no selector would be sent.
    pub fn is_untargeted(&self) -> bool {
        self.q.is_empty() && self.ids.iter().all(|id| is_blank(id)) && self.folder_path.is_empty()
    }
}

impl ServiceRequest for RemoveRequest {
    const OPERATION: Operation = Operation::Remove;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.remove
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        let mut params = TransportParams::new();
        params.insert_non_empty("q", &self.q);
        insert_list(&mut params, "ids", &self.ids);
        params.insert_non_empty("folderPath", &self.folder_path);
        params.insert("async", self.run_async);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("q={}, ids={}, folderPath={}", self.q, self.ids.join(","), self.folder_path)
    }
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

/// The relation type linking a collection to its members.
pub const CONTAINS: &str = "contains";

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRelationRequest {
    pub relation_type: String,
    pub target1_id: String,
    pub target2_id: String,
    pub metadata: Metadata,
}

impl CreateRelationRequest {
    pub fn new(
        relation_type: impl Into<String>,
        target1_id: impl Into<String>,
        target2_id: impl Into<String>,
    ) -> Self {
        Self {
            relation_type: relation_type.into(),
            target1_id: target1_id.into(),
            target2_id: target2_id.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl ServiceRequest for CreateRelationRequest {
    const OPERATION: Operation = Operation::CreateRelation;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.create_relation
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        require(Self::OPERATION, "relation type", &self.relation_type)?;
        require(Self::OPERATION, "target1 id", &self.target1_id)?;
        require(Self::OPERATION, "target2 id", &self.target2_id)?;
        let mut params = TransportParams::new();
        params.insert("relationType", self.relation_type.as_str());
        params.insert("target1Id", self.target1_id.as_str());
        params.insert("target2Id", self.target2_id.as_str());
        insert_metadata(Self::OPERATION, &mut params, &self.metadata)?;
        Ok(params)
    }

    fn context(&self) -> String {
        format!(
            "relationType={}, target1Id={}, target2Id={}",
            self.relation_type, self.target1_id, self.target2_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveRelationRequest {
    pub relation_ids: Vec<String>,
}

impl RemoveRelationRequest {
    pub fn new<I, S>(relation_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relation_ids: owned_list(relation_ids),
        }
    }
}

impl ServiceRequest for RemoveRelationRequest {
    const OPERATION: Operation = Operation::RemoveRelation;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.remove_relation
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        require(Self::OPERATION, "relation ids", &self.relation_ids.join(""))?;
        let mut params = TransportParams::new();
        insert_list(&mut params, "relationIds", &self.relation_ids);
        Ok(params)
    }

    fn context(&self) -> String {
        format!("relationIds={}", self.relation_ids.join(","))
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub client_type: Option<String>,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client_type: None,
        }
    }

    pub fn with_client_type(mut self, client_type: impl Into<String>) -> Self {
        self.client_type = Some(client_type.into());
        self
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_type", &self.client_type)
            .finish()
    }
}

impl ServiceRequest for LoginRequest {
    const OPERATION: Operation = Operation::Login;

    fn endpoint(endpoints: &Endpoints) -> &str {
        &endpoints.login
    }

    fn to_transport_params(&self) -> Result<TransportParams, AssetsError> {
        require(Self::OPERATION, "username", &self.username)?;
        let mut params = TransportParams::new();
        params.insert("username", self.username.as_str());
        params.insert("password", self.password.as_str());
        if let Some(client_type) = &self.client_type {
            params.insert_non_empty("clientType", client_type);
        }
        Ok(params)
    }

    fn context(&self) -> String {
        format!("username={}", self.username)
    }
}

// ---------------------------------------------------------------------------
// Folder API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFolderRequest {
    pub path: String,
}

impl GetFolderRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ApiRequest for GetFolderRequest {
    const OPERATION: Operation = Operation::GetFolder;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn api_path(&self, protocol: &ProtocolConfig) -> Result<String, AssetsError> {
        require(Self::OPERATION, "folder path", &self.path)?;
        Ok(protocol.folder_path("get"))
    }

    fn to_api_body(&self) -> Option<Value> {
        Some(json!({ "path": self.path }))
    }

    fn context(&self) -> String {
        format!("path={}", self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFolderRequest {
    pub path: String,
    pub metadata: Metadata,
}

impl CreateFolderRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl ApiRequest for CreateFolderRequest {
    const OPERATION: Operation = Operation::CreateFolder;

    fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    fn api_path(&self, protocol: &ProtocolConfig) -> Result<String, AssetsError> {
        require(Self::OPERATION, "folder path", &self.path)?;
        Ok(protocol.folder_path(""))
    }

    fn to_api_body(&self) -> Option<Value> {
        Some(json!({
            "path": self.path,
            "metadata": normalize_metadata(&self.metadata),
        }))
    }

    fn context(&self) -> String {
        format!("path={}", self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFolderRequest {
    pub id: String,
    pub metadata: Metadata,
}

impl UpdateFolderRequest {
    pub fn new(id: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }
}

impl ApiRequest for UpdateFolderRequest {
    const OPERATION: Operation = Operation::UpdateFolder;

    fn method(&self) -> HttpMethod {
        HttpMethod::Put
    }

    fn api_path(&self, protocol: &ProtocolConfig) -> Result<String, AssetsError> {
        require(Self::OPERATION, "folder id", &self.id)?;
        Ok(protocol.folder_path(&self.id))
    }

    fn to_api_body(&self) -> Option<Value> {
        Some(json!({ "metadata": normalize_metadata(&self.metadata) }))
    }

    fn context(&self) -> String {
        format!("id={}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveFolderRequest {
    pub id: String,
}

impl RemoveFolderRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl ApiRequest for RemoveFolderRequest {
    const OPERATION: Operation = Operation::RemoveFolder;

    fn method(&self) -> HttpMethod {
        HttpMethod::Delete
    }

    fn api_path(&self, protocol: &ProtocolConfig) -> Result<String, AssetsError> {
        require(Self::OPERATION, "folder id", &self.id)?;
        Ok(protocol.folder_path(&self.id))
    }

    fn to_api_body(&self) -> Option<Value> {
        None
    }

    fn context(&self) -> String {
        format!("id={}", self.id)
    }
}
