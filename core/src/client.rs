//! Operation facade over an [`HttpGateway`].
//!
//! # Design
//! `AssetsClient` holds a gateway and an immutable [`ProtocolConfig`] and
//! carries no other state between calls. Each operation flattens its request,
//! makes exactly one gateway call at a fixed endpoint or path, and decodes
//! the body into a typed response. Gateway failures are wrapped with the
//! operation name and the request's identifiers; nothing is retried.
//!
//! Mutating operations log at `info`, read-only ones at `debug`.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ProtocolConfig;
use crate::error::{AssetsError, Operation};
use crate::http::{HttpGateway, TransportParams};
use crate::request::{
    ApiRequest, BrowseRequest, CheckoutRequest, CopyAssetRequest, CreateFolderRequest, CreateRelationRequest,
    CreateRequest, GetFolderRequest, LoginRequest, MoveRequest, RemoveFolderRequest, RemoveRelationRequest,
    RemoveRequest, SearchRequest, ServiceRequest, UpdateBulkRequest, UpdateFolderRequest, UpdateRequest,
};
use crate::response::{
    AssetResponse, BrowseResponse, CheckoutResponse, FolderResponse, LoginResponse, ProcessResponse,
    SearchResponse,
};

/// Synchronous client for the Assets / Elvis REST service.
#[derive(Debug, Clone)]
pub struct AssetsClient<G> {
    gateway: G,
    protocol: ProtocolConfig,
}

impl<G: HttpGateway> AssetsClient<G> {
    /// A client using the Assets protocol profile.
    pub fn new(gateway: G) -> Self {
        Self::with_protocol(gateway, ProtocolConfig::assets())
    }

    pub fn with_protocol(gateway: G, protocol: ProtocolConfig) -> Self {
        Self { gateway, protocol }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn protocol(&self) -> &ProtocolConfig {
        &self.protocol
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse, AssetsError> {
        debug!(operation = %Operation::Search, q = %request.q, num = ?request.num, "searching assets");
        let json = self.call_service(request)?;
        Ok(SearchResponse::from_transport_json(&json))
    }

    pub fn browse(&self, request: &BrowseRequest) -> Result<BrowseResponse, AssetsError> {
        debug!(operation = %Operation::Browse, path = %request.path, "browsing folder");
        let json = self.call_service(request)?;
        Ok(BrowseResponse::from_transport_json(&json))
    }

    pub fn create(&self, request: &CreateRequest) -> Result<AssetResponse, AssetsError> {
        info!(operation = %Operation::Create, context = %request.context(), "creating asset");
        let json = self.call_service(request)?;
        Ok(AssetResponse::from_transport_json(&json))
    }

    /// Update metadata and/or the file of one asset. `clearCheckoutState` is
    /// dropped for protocol profiles that do not support it.
    pub fn update(&self, request: &UpdateRequest) -> Result<AssetResponse, AssetsError> {
        info!(operation = %Operation::Update, id = %request.id, "updating asset");
        let mut params = request.to_transport_params()?;
        if !self.protocol.clear_checkout_state {
            params.remove("clearCheckoutState");
        }
        let json = self.send_service(
            Operation::Update,
            UpdateRequest::endpoint(&self.protocol.endpoints),
            &params,
            request.context(),
        )?;
        Ok(AssetResponse::from_transport_json(&json))
    }

    pub fn update_bulk(&self, request: &UpdateBulkRequest) -> Result<ProcessResponse, AssetsError> {
        info!(operation = %Operation::UpdateBulk, q = %request.q, "updating assets in bulk");
        let json = self.call_service(request)?;
        Ok(ProcessResponse::from_transport_json(&json))
    }

    /// Check out an asset without downloading its file.
    pub fn checkout(&self, request: &CheckoutRequest) -> Result<CheckoutResponse, AssetsError> {
        info!(operation = %Operation::Checkout, id = %request.id, "checking out asset");
        let json = self.call_service(&request.forcing_download(false))?;
        Ok(CheckoutResponse::from_transport_json(&json))
    }

    /// Check out an asset and write its current file to `target`.
    pub fn checkout_and_download(&self, request: &CheckoutRequest, target: &Path) -> Result<(), AssetsError> {
        let operation = Operation::CheckoutAndDownload;
        info!(operation = %operation, id = %request.id, target = %target.display(), "checking out and downloading asset");
        let request = request.forcing_download(true);
        let params = request.to_transport_params()?;
        let context = format!("{}, target={}", request.context(), target.display());
        let response = self
            .gateway
            .raw_service_request(CheckoutRequest::endpoint(&self.protocol.endpoints), &params)
            .map_err(|source| AssetsError::transport(operation, context.clone(), source))?;
        self.gateway
            .write_response_body_to_path(&response, target)
            .map_err(|source| AssetsError::transport(operation, context, source))
    }

    pub fn copy_asset(&self, request: &CopyAssetRequest) -> Result<ProcessResponse, AssetsError> {
        info!(operation = %Operation::CopyAsset, source = %request.source, target = %request.target, "copying asset");
        let json = self.call_service(request)?;
        Ok(ProcessResponse::from_transport_json(&json))
    }

    /// Move or rename an asset or folder.
    pub fn move_asset(&self, request: &MoveRequest) -> Result<ProcessResponse, AssetsError> {
        info!(operation = %Operation::Move, source = %request.source, target = %request.target, "moving asset");
        let json = self.call_service(request)?;
        Ok(ProcessResponse::from_transport_json(&json))
    }

    /// Remove assets or a folder. A request with no selector is rejected
    /// before anything is sent.
    pub fn remove(&self, request: &RemoveRequest) -> Result<ProcessResponse, AssetsError> {
        info!(
            operation = %Operation::Remove,
            q = %request.q,
            ids = %request.ids.join(","),
            folder_path = %request.folder_path,
            "removing assets"
        );
        if request.is_untargeted() {
            return Err(AssetsError::validation(
                Operation::Remove,
                "one of q, ids or folderPath is required",
            ));
        }
        let json = self.call_service(request)?;
        Ok(ProcessResponse::from_transport_json(&json))
    }

    pub fn create_relation(&self, request: &CreateRelationRequest) -> Result<(), AssetsError> {
        info!(
            operation = %Operation::CreateRelation,
            relation_type = %request.relation_type,
            target1_id = %request.target1_id,
            target2_id = %request.target2_id,
            "creating relation"
        );
        self.call_service(request)?;
        Ok(())
    }

    pub fn remove_relation(&self, request: &RemoveRelationRequest) -> Result<ProcessResponse, AssetsError> {
        info!(
            operation = %Operation::RemoveRelation,
            relation_ids = %request.relation_ids.join(","),
            "removing relations"
        );
        let json = self.call_service(request)?;
        Ok(ProcessResponse::from_transport_json(&json))
    }

    /// Log in through the service endpoint. Keeping the session is the
    /// gateway's business; this only shapes the call and decodes the answer.
    pub fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AssetsError> {
        debug!(operation = %Operation::Login, username = %request.username, "logging in");
        let json = self.call_service(request)?;
        Ok(LoginResponse::from_transport_json(&json))
    }

    pub fn get_folder(&self, request: &GetFolderRequest) -> Result<FolderResponse, AssetsError> {
        debug!(operation = %Operation::GetFolder, path = %request.path, "fetching folder");
        let json = self.call_api(request)?;
        Ok(FolderResponse::from_transport_json(&json))
    }

    pub fn create_folder(&self, request: &CreateFolderRequest) -> Result<FolderResponse, AssetsError> {
        info!(operation = %Operation::CreateFolder, path = %request.path, "creating folder");
        let json = self.call_api(request)?;
        Ok(FolderResponse::from_transport_json(&json))
    }

    /// Fails without calling the gateway when the folder id is empty.
    pub fn update_folder(&self, request: &UpdateFolderRequest) -> Result<FolderResponse, AssetsError> {
        info!(operation = %Operation::UpdateFolder, id = %request.id, "updating folder");
        let json = self.call_api(request)?;
        Ok(FolderResponse::from_transport_json(&json))
    }

    /// Fails without calling the gateway when the folder id is empty.
    pub fn remove_folder(&self, request: &RemoveFolderRequest) -> Result<(), AssetsError> {
        info!(operation = %Operation::RemoveFolder, id = %request.id, "removing folder");
        self.call_api(request)?;
        Ok(())
    }

    /// Download any file URL served by the DAM to `target`.
    pub fn download_file(&self, url: &str, target: &Path) -> Result<(), AssetsError> {
        debug!(operation = %Operation::DownloadFile, url, target = %target.display(), "downloading file");
        self.download(Operation::DownloadFile, url, target)
    }

    pub(crate) fn download(&self, operation: Operation, url: &str, target: &Path) -> Result<(), AssetsError> {
        self.gateway.download_file_to_path(url, target).map_err(|source| {
            AssetsError::transport(operation, format!("url={url}, target={}", target.display()), source)
        })
    }

    fn call_service<R: ServiceRequest>(&self, request: &R) -> Result<Value, AssetsError> {
        let params = request.to_transport_params()?;
        self.send_service(
            R::OPERATION,
            R::endpoint(&self.protocol.endpoints),
            &params,
            request.context(),
        )
    }

    fn send_service(
        &self,
        operation: Operation,
        endpoint: &str,
        params: &TransportParams,
        context: String,
    ) -> Result<Value, AssetsError> {
        self.gateway.service_request(endpoint, params).map_err(|source| {
            debug!(operation = %operation, endpoint, params = %params.describe(), error = %source, "service call failed");
            AssetsError::transport(operation, context, source)
        })
    }

    fn call_api<R: ApiRequest>(&self, request: &R) -> Result<Value, AssetsError> {
        let path = request.api_path(&self.protocol)?;
        let method = request.method();
        let body = request.to_api_body();
        self.gateway
            .api_request(method, &path, body.as_ref())
            .map_err(|source| AssetsError::transport(R::OPERATION, format!("{method} {path}, {}", request.context()), source))
    }
}
