//! In-memory asset, relation and folder tables.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::query::{value_matches, Query, RelationFilter};

pub const COLLECTION_EXTENSION: &str = ".collection";

/// A failed store operation: HTTP status plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub status: u16,
    pub message: String,
}

impl Failure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub id: String,
    pub metadata: Map<String, Value>,
    pub content: Vec<u8>,
    pub checked_out: Option<(i64, String)>,
}

impl Asset {
    pub fn asset_path(&self) -> &str {
        self.metadata.get("assetPath").and_then(Value::as_str).unwrap_or("")
    }

    fn set_asset_path(&mut self, path: &str) {
        let (folder, name) = split_path(path);
        self.metadata.insert("assetPath".to_string(), json!(path));
        self.metadata.insert("folderPath".to_string(), json!(folder));
        self.metadata.insert("name".to_string(), json!(name));
    }

    fn field_matches(&self, field: &str, pattern: &str) -> bool {
        match field {
            "id" => value_matches(pattern, &self.id),
            "ancestorPaths" => {
                let prefix = pattern.trim_end_matches('/');
                self.asset_path().starts_with(&format!("{prefix}/"))
            }
            _ => match self.metadata.get(field) {
                Some(Value::Array(items)) => items.iter().any(|item| scalar_matches(pattern, item)),
                Some(value) => scalar_matches(pattern, value),
                None => false,
            },
        }
    }
}

fn scalar_matches(pattern: &str, value: &Value) -> bool {
    match value {
        Value::String(s) => value_matches(pattern, s),
        Value::Number(n) => value_matches(pattern, &n.to_string()),
        Value::Bool(b) => value_matches(pattern, &b.to_string()),
        _ => false,
    }
}

fn split_path(path: &str) -> (String, String) {
    match path.rsplit_once('/') {
        Some((folder, name)) => (folder.to_string(), name.to_string()),
        None => (String::new(), path.to_string()),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub relation_id: String,
    pub relation_type: String,
    pub target1_id: String,
    pub target2_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub id: String,
    pub path: String,
    pub name: String,
    pub permissions: String,
    pub metadata: Map<String, Value>,
}

/// A search hit: the asset plus, for relation queries, the matched relation.
pub struct Hit<'a> {
    pub asset: &'a Asset,
    pub relation: Option<&'a Relation>,
}

#[derive(Debug, Default)]
pub struct Store {
    assets: BTreeMap<String, Asset>,
    relations: BTreeMap<String, Relation>,
    folders: BTreeMap<String, Folder>,
}

/// Apply an update: empty strings clear a field, anything else overwrites.
fn merge_metadata(target: &mut Map<String, Value>, changes: &Map<String, Value>) {
    for (field, value) in changes {
        match value {
            Value::String(s) if s.is_empty() => {
                target.remove(field);
            }
            other => {
                target.insert(field.clone(), other.clone());
            }
        }
    }
}

impl Store {
    pub fn asset(&self, id: &str) -> Result<&Asset, Failure> {
        self.assets
            .get(id)
            .ok_or_else(|| Failure::not_found(format!("Asset not found: {id}")))
    }

    fn asset_by_path(&self, path: &str) -> Option<&Asset> {
        self.assets.values().find(|asset| asset.asset_path() == path)
    }

    pub fn create_asset(&mut self, metadata: Map<String, Value>, content: Vec<u8>) -> Result<&Asset, Failure> {
        let path = metadata
            .get("assetPath")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Failure::bad_request("assetPath is required"))?
            .to_string();
        if self.asset_by_path(&path).is_some() {
            return Err(Failure::new(409, format!("Asset already exists: {path}")));
        }
        let id = Uuid::new_v4().simple().to_string();
        let mut asset = Asset {
            id: id.clone(),
            metadata: Map::new(),
            content,
            checked_out: None,
        };
        merge_metadata(&mut asset.metadata, &metadata);
        asset.set_asset_path(&path);
        if path.ends_with(COLLECTION_EXTENSION) {
            asset.metadata.insert("assetDomain".to_string(), json!("container"));
        }
        Ok(self.assets.entry(id).or_insert(asset))
    }

    pub fn update_asset(&mut self, id: &str, metadata: &Map<String, Value>, clear_checkout: bool) -> Result<&Asset, Failure> {
        let asset = self
            .assets
            .get_mut(id)
            .ok_or_else(|| Failure::not_found(format!("Asset not found: {id}")))?;
        merge_metadata(&mut asset.metadata, metadata);
        if clear_checkout {
            asset.checked_out = None;
        }
        Ok(asset)
    }

    pub fn checkout(&mut self, id: &str, user: &str, now_ms: i64) -> Result<&Asset, Failure> {
        let asset = self
            .assets
            .get_mut(id)
            .ok_or_else(|| Failure::not_found(format!("Asset not found: {id}")))?;
        asset.checked_out = Some((now_ms, user.to_string()));
        Ok(asset)
    }

    /// Assets matching `query`, ordered by path.
    pub fn search(&self, query: &Query) -> Vec<Hit<'_>> {
        let mut hits: Vec<Hit<'_>> = match &query.relation {
            Some(filter) => self
                .relations
                .values()
                .filter_map(|relation| self.related_asset(filter, relation).map(|asset| (asset, relation)))
                .map(|(asset, relation)| Hit {
                    asset,
                    relation: Some(relation),
                })
                .collect(),
            None => self
                .assets
                .values()
                .map(|asset| Hit { asset, relation: None })
                .collect(),
        };
        hits.retain(|hit| {
            query
                .terms
                .iter()
                .all(|(field, value)| hit.asset.field_matches(field, value))
        });
        hits.sort_by(|a, b| a.asset.asset_path().cmp(b.asset.asset_path()));
        hits
    }

    fn related_asset(&self, filter: &RelationFilter, relation: &Relation) -> Option<&Asset> {
        if !filter.relation_type.is_empty() && relation.relation_type != filter.relation_type {
            return None;
        }
        let as_child = relation.target1_id == filter.related_to;
        let as_parent = relation.target2_id == filter.related_to;
        let other = match filter.target.to_ascii_uppercase().as_str() {
            "CHILD" if as_child => &relation.target2_id,
            "PARENT" if as_parent => &relation.target1_id,
            "" if as_child => &relation.target2_id,
            "" if as_parent => &relation.target1_id,
            _ => return None,
        };
        self.assets.get(other)
    }

    pub fn update_bulk(&mut self, query: &Query, metadata: &Map<String, Value>) -> usize {
        let ids: Vec<String> = self.search(query).iter().map(|hit| hit.asset.id.clone()).collect();
        for id in &ids {
            if let Some(asset) = self.assets.get_mut(id) {
                merge_metadata(&mut asset.metadata, metadata);
            }
        }
        ids.len()
    }

    /// Copy the asset at `source` to `target`. Returns (processed, errors).
    pub fn copy(&mut self, source: &str, target: &str, policy: &str) -> Result<(i64, i64), Failure> {
        let original = self
            .asset_by_path(source)
            .cloned()
            .ok_or_else(|| Failure::not_found(format!("Source not found: {source}")))?;
        let target_path = match self.resolve_conflict(target, policy)? {
            Some(path) => path,
            None => return Ok((0, 0)),
        };
        let mut metadata = original.metadata.clone();
        metadata.insert("assetPath".to_string(), json!(target_path));
        self.create_asset(metadata, original.content)?;
        Ok((1, 0))
    }

    /// Decide the path a copy or move lands on, or `None` to skip it.
    fn resolve_conflict(&mut self, target: &str, policy: &str) -> Result<Option<String>, Failure> {
        let Some(existing) = self.asset_by_path(target).map(|a| a.id.clone()) else {
            return Ok(Some(target.to_string()));
        };
        match policy {
            "OVERWRITE" | "OVERWRITE_IF_NEWER" => {
                self.remove_assets(&[existing]);
                Ok(Some(target.to_string()))
            }
            "DO_NOTHING" => Ok(None),
            "THROW_EXCEPTION" => Err(Failure::new(409, format!("Target exists: {target}"))),
            _ => {
                let (folder, name) = split_path(target);
                let (stem, ext) = match name.rsplit_once('.') {
                    Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
                    None => (name.clone(), String::new()),
                };
                let renamed = (1..)
                    .map(|n| format!("{folder}/{stem}-{n}{ext}"))
                    .find(|candidate| self.asset_by_path(candidate).is_none())
                    .unwrap_or_default();
                Ok(Some(renamed))
            }
        }
    }

    /// Move an asset, or every asset below a folder, to `target`.
    pub fn move_path(&mut self, source: &str, target: &str, file_policy: &str) -> Result<i64, Failure> {
        if let Some(id) = self.asset_by_path(source).map(|a| a.id.clone()) {
            let Some(target_path) = self.resolve_conflict(target, file_policy)? else {
                return Ok(0);
            };
            if let Some(asset) = self.assets.get_mut(&id) {
                asset.set_asset_path(&target_path);
            }
            return Ok(1);
        }

        let prefix = format!("{}/", source.trim_end_matches('/'));
        let mut moved = 0;
        for asset in self.assets.values_mut() {
            let path = asset.asset_path().to_string();
            if let Some(rest) = path.strip_prefix(&prefix) {
                asset.set_asset_path(&format!("{}/{rest}", target.trim_end_matches('/')));
                moved += 1;
            }
        }
        for folder in self.folders.values_mut() {
            if folder.path == source {
                folder.path = target.to_string();
                folder.name = split_path(target).1;
            } else if let Some(rest) = folder.path.strip_prefix(&prefix) {
                folder.path = format!("{}/{rest}", target.trim_end_matches('/'));
            }
        }
        if moved == 0 && !self.folders.values().any(|f| f.path == target) {
            return Err(Failure::not_found(format!("Source not found: {source}")));
        }
        Ok(moved)
    }

    /// Remove assets and the relations touching them. Returns the number of
    /// assets removed.
    pub fn remove_assets(&mut self, ids: &[String]) -> i64 {
        let mut removed = 0;
        for id in ids {
            if self.assets.remove(id).is_some() {
                removed += 1;
            }
        }
        self.relations
            .retain(|_, r| !ids.contains(&r.target1_id) && !ids.contains(&r.target2_id));
        removed
    }

    /// Remove a folder, its sub-folders and every asset below it.
    pub fn remove_folder_path(&mut self, folder_path: &str) -> i64 {
        let prefix = format!("{}/", folder_path.trim_end_matches('/'));
        let ids: Vec<String> = self
            .assets
            .values()
            .filter(|asset| asset.asset_path().starts_with(&prefix))
            .map(|asset| asset.id.clone())
            .collect();
        let removed = self.remove_assets(&ids);
        let before = self.folders.len();
        self.folders
            .retain(|_, f| f.path != folder_path && !f.path.starts_with(&prefix));
        removed + (before - self.folders.len()) as i64
    }

    pub fn create_relation(&mut self, relation_type: &str, target1_id: &str, target2_id: &str) -> Result<&Relation, Failure> {
        self.asset(target1_id)?;
        self.asset(target2_id)?;
        let relation_id = Uuid::new_v4().simple().to_string();
        let relation = Relation {
            relation_id: relation_id.clone(),
            relation_type: relation_type.to_string(),
            target1_id: target1_id.to_string(),
            target2_id: target2_id.to_string(),
        };
        Ok(self.relations.entry(relation_id).or_insert(relation))
    }

    /// Returns (processed, errors); unknown ids count as errors.
    pub fn remove_relations(&mut self, ids: &[&str]) -> (i64, i64) {
        ids.iter().fold((0, 0), |(ok, err), id| {
            if self.relations.remove(*id).is_some() {
                (ok + 1, err)
            } else {
                (ok, err + 1)
            }
        })
    }

    pub fn folder_by_path(&self, path: &str) -> Result<&Folder, Failure> {
        self.folders
            .values()
            .find(|folder| folder.path == path)
            .ok_or_else(|| Failure::not_found(format!("Folder not found: {path}")))
    }

    pub fn create_folder(&mut self, path: &str, metadata: &Map<String, Value>) -> Result<&Folder, Failure> {
        if path.is_empty() {
            return Err(Failure::bad_request("path is required"));
        }
        if self.folder_by_path(path).is_ok() {
            return Err(Failure::new(409, format!("Folder already exists: {path}")));
        }
        let id = Uuid::new_v4().simple().to_string();
        let mut folder = Folder {
            id: id.clone(),
            path: path.to_string(),
            name: split_path(path).1,
            permissions: "VPUMERXC".to_string(),
            metadata: Map::new(),
        };
        merge_metadata(&mut folder.metadata, metadata);
        Ok(self.folders.entry(id).or_insert(folder))
    }

    pub fn update_folder(&mut self, id: &str, metadata: &Map<String, Value>) -> Result<&Folder, Failure> {
        let folder = self
            .folders
            .get_mut(id)
            .ok_or_else(|| Failure::not_found(format!("Folder not found: {id}")))?;
        merge_metadata(&mut folder.metadata, metadata);
        Ok(folder)
    }

    pub fn remove_folder(&mut self, id: &str) -> Result<i64, Failure> {
        let path = self
            .folders
            .get(id)
            .map(|f| f.path.clone())
            .ok_or_else(|| Failure::not_found(format!("Folder not found: {id}")))?;
        Ok(self.remove_folder_path(&path))
    }

    /// Direct children of `path`: registered folders plus assets.
    pub fn browse(&self, path: &str) -> (Vec<&Folder>, Vec<&Asset>) {
        let parent = path.trim_end_matches('/');
        let folders = self
            .folders
            .values()
            .filter(|f| split_path(&f.path).0 == parent)
            .collect();
        let assets = self
            .assets
            .values()
            .filter(|a| a.metadata.get("folderPath").and_then(Value::as_str) == Some(parent))
            .collect();
        (folders, assets)
    }
}
