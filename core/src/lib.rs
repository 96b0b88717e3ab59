//! Typed client core for the WoodWing Assets (and legacy Elvis) REST service.
//!
//! # Overview
//! Shapes requests for search, browse, asset and folder CRUD, relations,
//! checkout and downloads, and decodes the JSON answers into typed
//! responses. All I/O goes through an [`HttpGateway`] supplied by the host,
//! which also owns authentication, CSRF handling, multipart encoding and
//! retries (host-does-IO pattern).
//!
//! # Design
//! - Request values ([`request`]) flatten into the form map or JSON body an
//!   endpoint expects.
//! - Response types ([`response`]) decode leniently: missing or mistyped
//!   fields become zero values, never errors.
//! - [`AssetsClient`] makes one gateway call per operation and wraps
//!   failures in [`AssetsError`] with the operation name and identifiers.
//! - Composite helpers (unique lookups, container membership, collection
//!   creation, original-file download) are built on top of the facade.
//! - Assets and Elvis differ only in a [`ProtocolConfig`].
//!
//! ```
//! use assets_core::{AssetsClient, RemoveRequest, TransportParams};
//! # use assets_core::{HttpGateway, HttpMethod, RawResponse, TransportError};
//! # use serde_json::{json, Value};
//! # use std::path::Path;
//! # struct Gateway;
//! # impl HttpGateway for Gateway {
//! #     fn service_request(&self, _: &str, _: &TransportParams) -> Result<Value, TransportError> {
//! #         Ok(json!({"processedCount": 1, "errorCount": 0}))
//! #     }
//! #     fn api_request(&self, _: HttpMethod, _: &str, _: Option<&Value>) -> Result<Value, TransportError> {
//! #         Ok(json!({}))
//! #     }
//! #     fn raw_service_request(&self, _: &str, _: &TransportParams) -> Result<RawResponse, TransportError> {
//! #         Ok(RawResponse::default())
//! #     }
//! #     fn download_file_to_path(&self, _: &str, _: &Path) -> Result<(), TransportError> {
//! #         Ok(())
//! #     }
//! # }
//! let client = AssetsClient::new(Gateway);
//! let result = client.remove(&RemoveRequest::by_folder_path("/Demo Zone/Old"))?;
//! assert_eq!(result.processed_count, 1);
//! # Ok::<(), assets_core::AssetsError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod http;
pub mod metadata;
pub mod request;
pub mod response;

#[cfg(test)]
mod testing;

pub use client::AssetsClient;
pub use config::{Endpoints, Flavor, ProtocolConfig};
pub use error::{AssetsError, Operation, TransportError};
pub use helpers::relation_search_query;
pub use http::{FileHandle, HttpGateway, HttpMethod, ParamValue, RawResponse, TransportParams};
pub use metadata::{encode_metadata, normalize_metadata, Metadata};
pub use request::{
    ApiRequest, BrowseRequest, CheckoutRequest, CopyAssetRequest, CreateFolderRequest, CreateRelationRequest,
    CreateRequest, FileReplacePolicy, FolderReplacePolicy, GetFolderRequest, LoginRequest, MoveRequest,
    RemoveFolderRequest, RemoveRelationRequest, RemoveRequest, SearchRequest, ServiceRequest,
    UpdateBulkRequest, UpdateFolderRequest, UpdateRequest, CONTAINS,
};
pub use response::{
    AssetResponse, BrowseItem, BrowseResponse, CheckoutResponse, FolderResponse, LoginResponse,
    ProcessResponse, RelationResponse, SearchResponse,
};
