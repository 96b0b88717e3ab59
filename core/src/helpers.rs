//! Conveniences composed from several facade calls.
//!
//! These inspect an intermediate search result before deciding what, if
//! anything, to send next. Lookups that expect a unique asset treat zero hits
//! as `NotFound` and surplus hits as `Integrity` rather than guessing.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::AssetsClient;
use crate::error::{AssetsError, Operation};
use crate::http::HttpGateway;
use crate::metadata::Metadata;
use crate::request::{
    CreateRelationRequest, CreateRequest, RemoveRelationRequest, RemoveRequest, SearchRequest, CONTAINS,
};
use crate::response::{AssetResponse, ProcessResponse, SearchResponse};

/// Enough hits to tell "one" from "more than one".
const MULTIPLICITY_PROBE: u32 = 2;

/// Query fragment selecting assets related to `related_to`. Empty optional
/// clauses are left out.
///
/// ```
/// use assets_core::relation_search_query;
///
/// assert_eq!(
///     relation_search_query("C123", "child", "contains"),
///     "relatedTo:C123 relationTarget:child relationType:contains"
/// );
/// assert_eq!(relation_search_query("C123", "", ""), "relatedTo:C123");
/// ```
pub fn relation_search_query(related_to: &str, relation_target: &str, relation_type: &str) -> String {
    let mut q = format!("relatedTo:{related_to}");
    if !relation_target.is_empty() {
        q.push_str(&format!(" relationTarget:{relation_target}"));
    }
    if !relation_type.is_empty() {
        q.push_str(&format!(" relationType:{relation_type}"));
    }
    q
}

fn hit_count(search: &SearchResponse) -> i64 {
    search.total_hits.max(search.hits.len() as i64)
}

impl<G: HttpGateway> AssetsClient<G> {
    pub fn remove_by_id(&self, asset_id: &str) -> Result<ProcessResponse, AssetsError> {
        self.remove(&RemoveRequest::by_ids([asset_id]))
    }

    /// Relate `asset_id` to the collection `container_id`.
    pub fn add_to_container(&self, asset_id: &str, container_id: &str) -> Result<(), AssetsError> {
        self.create_relation(&CreateRelationRequest::new(CONTAINS, container_id, asset_id))
    }

    /// Remove the `contains` relation between `container_id` and `asset_id`.
    ///
    /// Returns zero counts without removing anything when the asset is not in
    /// the container. A hit that carries no relation id is an `Integrity`
    /// error.
    pub fn remove_from_container(&self, asset_id: &str, container_id: &str) -> Result<ProcessResponse, AssetsError> {
        let operation = Operation::RemoveFromContainer;
        let q = format!(
            "{} id:{asset_id}",
            relation_search_query(container_id, "CHILD", CONTAINS)
        );
        let search = self.search(
            &SearchRequest::new(q.as_str())
                .with_num(MULTIPLICITY_PROBE)
                .with_metadata_to_return(["id"]),
        )?;

        let Some(hit) = search.hits.first() else {
            info!(operation = %operation, asset_id, container_id, "asset not in container, nothing to remove");
            return Ok(ProcessResponse::default());
        };
        if search.hits.len() > 1 {
            warn!(
                operation = %operation,
                asset_id,
                container_id,
                hits = hit_count(&search),
                "several relations match, removing the first"
            );
        }

        let relation_id = hit.relation.relation_id.as_str();
        if relation_id.is_empty() {
            return Err(AssetsError::integrity(
                operation,
                format!("hit {} for query `{q}` carries no relation id", hit.id),
            ));
        }
        self.remove_relation(&RemoveRelationRequest::new([relation_id]))
    }

    /// Create a collection. Collections are ordinary assets whose path ends
    /// in `.collection`; `asset_path` is written into the metadata as is.
    pub fn create_collection(&self, asset_path: &str, metadata: Metadata) -> Result<AssetResponse, AssetsError> {
        let mut metadata = metadata;
        metadata.insert("assetPath".to_string(), Value::String(asset_path.to_string()));
        self.create(&CreateRequest::new(metadata))
    }

    /// Fetch the single asset with `asset_id`, returning `metadata_fields`
    /// (all fields when empty).
    pub fn search_asset<I, S>(&self, asset_id: &str, metadata_fields: I) -> Result<AssetResponse, AssetsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let operation = Operation::SearchAsset;
        if asset_id.trim().is_empty() {
            return Err(AssetsError::validation(operation, "asset id is empty"));
        }
        let search = self.search(
            &SearchRequest::new(format!("id:{asset_id}"))
                .with_num(MULTIPLICITY_PROBE)
                .with_metadata_to_return(metadata_fields),
        )?;
        let count = hit_count(&search);
        let mut hits = search.hits.into_iter();
        match (hits.next(), count) {
            (None, _) => Err(AssetsError::not_found(
                operation,
                format!("no asset found with id {asset_id}"),
            )),
            (Some(hit), 1) => Ok(hit),
            (Some(_), count) => Err(AssetsError::integrity(
                operation,
                format!("{count} assets found with id {asset_id}, expected exactly one"),
            )),
        }
    }

    /// Id of the asset matching `q`. Several hits are an error only when
    /// `fail_if_multiple_hits` is set; otherwise the first hit wins.
    pub fn search_asset_id(&self, q: &str, fail_if_multiple_hits: bool) -> Result<String, AssetsError> {
        let operation = Operation::SearchAssetId;
        let search = self.search(
            &SearchRequest::new(q)
                .with_num(MULTIPLICITY_PROBE)
                .with_metadata_to_return(["id"]),
        )?;
        let count = hit_count(&search);
        let Some(hit) = search.hits.into_iter().next() else {
            return Err(AssetsError::not_found(operation, format!("no asset found for query `{q}`")));
        };
        if count > 1 && fail_if_multiple_hits {
            return Err(AssetsError::integrity(
                operation,
                format!("{count} assets found for query `{q}`, expected one"),
            ));
        }
        Ok(hit.id)
    }

    /// Download the original file of `asset` to `target`.
    pub fn download_original_file(&self, asset: &AssetResponse, target: &Path) -> Result<(), AssetsError> {
        let operation = Operation::DownloadOriginalFile;
        if asset.original_url.is_empty() {
            return Err(AssetsError::validation(
                operation,
                format!("asset {} has no original file url", asset.id),
            ));
        }
        debug!(operation = %operation, id = %asset.id, target = %target.display(), "downloading original file");
        self.download(operation, &asset.original_url, target)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing::Level;

    use super::*;
    use crate::testing::{capture_levels, Call, FakeGateway};

    fn hits(ids: &[&str]) -> Value {
        let hits: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
        json!({"totalHits": ids.len(), "hits": hits})
    }

    #[test]
    fn relation_query_appends_only_present_clauses() {
        assert_eq!(
            relation_search_query("C123", "child", "contains"),
            "relatedTo:C123 relationTarget:child relationType:contains"
        );
        assert_eq!(relation_search_query("C123", "", ""), "relatedTo:C123");
        assert_eq!(
            relation_search_query("C123", "", "contains"),
            "relatedTo:C123 relationType:contains"
        );
    }

    #[test]
    fn remove_by_id_targets_single_id() {
        let gateway = FakeGateway::new().reply(json!({"processedCount": 1, "errorCount": 0}));
        let result = AssetsClient::new(&gateway).remove_by_id("A1").unwrap();
        assert_eq!(result.processed_count, 1);
        let (endpoint, params) = gateway.service_params(0);
        assert_eq!(endpoint, "remove");
        assert_eq!(params.text("ids"), Some("A1"));
        assert!(!params.contains_key("q"));
        assert!(!params.contains_key("folderPath"));
    }

    #[test]
    fn add_to_container_puts_container_first() {
        let gateway = FakeGateway::new().reply(json!({}));
        AssetsClient::new(&gateway).add_to_container("A1", "C1").unwrap();
        let (endpoint, params) = gateway.service_params(0);
        assert_eq!(endpoint, "createRelation");
        assert_eq!(params.text("relationType"), Some("contains"));
        assert_eq!(params.text("target1Id"), Some("C1"));
        assert_eq!(params.text("target2Id"), Some("A1"));
    }

    #[test]
    fn remove_from_container_without_hits_is_a_no_op() {
        let gateway = FakeGateway::new().reply(hits(&[]));
        let result = AssetsClient::new(&gateway).remove_from_container("A1", "C1").unwrap();
        assert_eq!(result.processed_count, 0);
        assert_eq!(result.error_count, 0);
        assert_eq!(gateway.calls().len(), 1, "no removeRelation call expected");

        let (_, params) = gateway.service_params(0);
        assert_eq!(
            params.text("q"),
            Some("relatedTo:C1 relationTarget:CHILD relationType:contains id:A1")
        );
        assert_eq!(params.text("num"), Some("2"));
        assert_eq!(params.text("metadataToReturn"), Some("id"));
    }

    #[test]
    fn remove_from_container_removes_found_relation() {
        let gateway = FakeGateway::new()
            .reply(json!({
                "totalHits": 1,
                "hits": [{"id": "A1", "relation": {"relationId": "R9", "relationType": "contains"}}]
            }))
            .reply(json!({"processedCount": 1, "errorCount": 0}));
        let result = AssetsClient::new(&gateway).remove_from_container("A1", "C1").unwrap();
        assert_eq!(result.processed_count, 1);
        let (endpoint, params) = gateway.service_params(1);
        assert_eq!(endpoint, "removeRelation");
        assert_eq!(params.text("relationIds"), Some("R9"));
    }

    #[test]
    fn remove_from_container_hit_without_relation_fails_loudly() {
        let gateway = FakeGateway::new().reply(hits(&["A1"]));
        let err = AssetsClient::new(&gateway).remove_from_container("A1", "C1").unwrap_err();
        assert!(matches!(err, AssetsError::Integrity { operation: Operation::RemoveFromContainer, .. }));
        assert!(err.to_string().contains("A1"), "{err}");
        assert_eq!(gateway.calls().len(), 1);
    }

    #[test]
    fn create_collection_injects_asset_path() {
        let gateway = FakeGateway::new().reply(json!({"id": "C1", "metadata": {"assetPath": "/Demo/set.collection"}}));
        let mut metadata = Metadata::new();
        metadata.insert("description".to_string(), json!("holiday picks"));
        let collection = AssetsClient::new(&gateway)
            .create_collection("/Demo/set.collection", metadata)
            .unwrap();
        assert_eq!(collection.id, "C1");

        let (endpoint, params) = gateway.service_params(0);
        assert_eq!(endpoint, "create");
        assert!(!params.has_file());
        let sent: Value = serde_json::from_str(params.text("metadata").unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({"assetPath": "/Demo/set.collection", "description": "holiday picks"})
        );
    }

    #[test]
    fn search_asset_returns_unique_hit() {
        let gateway = FakeGateway::new().reply(hits(&["X"]));
        let asset = AssetsClient::new(&gateway).search_asset("X", ["name"]).unwrap();
        assert_eq!(asset.id, "X");
        let (_, params) = gateway.service_params(0);
        assert_eq!(params.text("q"), Some("id:X"));
        assert_eq!(params.text("metadataToReturn"), Some("name"));
    }

    #[test]
    fn search_asset_without_hits_is_not_found() {
        let gateway = FakeGateway::new().reply(hits(&[]));
        let err = AssetsClient::new(&gateway)
            .search_asset("X", Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, AssetsError::NotFound { operation: Operation::SearchAsset, .. }));
        assert!(err.to_string().contains('X'), "{err}");
    }

    #[test]
    fn search_asset_with_duplicates_is_integrity_error() {
        let gateway = FakeGateway::new().reply(hits(&["X", "X"]));
        let err = AssetsClient::new(&gateway)
            .search_asset("X", Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, AssetsError::Integrity { .. }));
        assert!(err.to_string().contains("2 assets"), "{err}");
    }

    #[test]
    fn search_asset_rejects_empty_id() {
        let gateway = FakeGateway::new();
        let err = AssetsClient::new(&gateway)
            .search_asset("", Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, AssetsError::Validation { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn search_asset_id_multiplicity() {
        let gateway = FakeGateway::new().reply(hits(&["first", "second"]));
        let id = AssetsClient::new(&gateway).search_asset_id("name:a*", false).unwrap();
        assert_eq!(id, "first");
        assert_eq!(gateway.service_params(0).1.text("num"), Some("2"));

        let gateway = FakeGateway::new().reply(json!({
            "totalHits": 17,
            "hits": [{"id": "first"}, {"id": "second"}]
        }));
        let err = AssetsClient::new(&gateway).search_asset_id("name:a*", true).unwrap_err();
        assert!(matches!(err, AssetsError::Integrity { operation: Operation::SearchAssetId, .. }));
        assert!(err.to_string().contains("17"), "{err}");
    }

    #[test]
    fn search_asset_id_without_hits_is_not_found() {
        let gateway = FakeGateway::new().reply(hits(&[]));
        let err = AssetsClient::new(&gateway).search_asset_id("name:none", false).unwrap_err();
        assert!(matches!(err, AssetsError::NotFound { .. }));
        assert!(err.to_string().contains("name:none"), "{err}");
    }

    #[test]
    fn download_original_file_requires_url() {
        let gateway = FakeGateway::new();
        let asset = AssetResponse {
            id: "A1".to_string(),
            ..AssetResponse::default()
        };
        let err = AssetsClient::new(&gateway)
            .download_original_file(&asset, Path::new("/tmp/a.jpg"))
            .unwrap_err();
        assert!(matches!(err, AssetsError::Validation { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn download_original_file_streams_url() {
        let gateway = FakeGateway::new();
        let asset = AssetResponse {
            id: "A1".to_string(),
            original_url: "http://dam/file/A1/*/a.jpg".to_string(),
            ..AssetResponse::default()
        };
        AssetsClient::new(&gateway)
            .download_original_file(&asset, Path::new("/tmp/a.jpg"))
            .unwrap();
        assert_eq!(
            gateway.calls(),
            vec![Call::Download {
                url: "http://dam/file/A1/*/a.jpg".to_string(),
                path: "/tmp/a.jpg".into(),
            }]
        );
    }

    #[test]
    fn download_failure_keeps_transport_code() {
        let gateway = FakeGateway::new().failing_downloads();
        let asset = AssetResponse {
            id: "A1".to_string(),
            original_url: "http://dam/file/A1".to_string(),
            ..AssetResponse::default()
        };
        let err = AssetsClient::new(&gateway)
            .download_original_file(&asset, Path::new("/tmp/a.jpg"))
            .unwrap_err();
        assert_eq!(err.code(), Some(404));
        assert_eq!(err.operation(), Operation::DownloadOriginalFile);
    }

    #[test]
    fn downloads_log_at_debug() {
        let gateway = FakeGateway::new();
        let client = AssetsClient::new(&gateway);
        let asset = AssetResponse {
            id: "A1".to_string(),
            original_url: "http://dam/file/A1".to_string(),
            ..AssetResponse::default()
        };
        let (result, levels) = capture_levels(|| client.download_original_file(&asset, Path::new("/tmp/a.jpg")));
        result.unwrap();
        assert_eq!(levels, vec![Level::DEBUG]);

        let (result, levels) = capture_levels(|| client.download_file("http://dam/file/A1", Path::new("/tmp/b.jpg")));
        result.unwrap();
        assert_eq!(levels, vec![Level::DEBUG]);
    }
}
