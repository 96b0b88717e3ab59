//! Protocol profiles for the two server families.
//!
//! # Design
//! Assets and its predecessor Elvis speak nearly the same contract. Rather
//! than two client hierarchies, one client reads the few differences from a
//! `ProtocolConfig`. The struct deserializes with every field defaulted, so a
//! host can load it from whatever configuration source it already has and
//! override only what differs.

use serde::Deserialize;

/// Which server family the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Assets,
    Elvis,
}

/// Names of the legacy service endpoints, relative to the gateway's
/// `services/` root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoints {
    pub search: String,
    pub browse: String,
    pub create: String,
    pub update: String,
    pub update_bulk: String,
    pub checkout: String,
    pub copy: String,
    #[serde(rename = "move")]
    pub move_: String,
    pub remove: String,
    pub create_relation: String,
    pub remove_relation: String,
    pub login: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search: "search".to_string(),
            browse: "browse".to_string(),
            create: "create".to_string(),
            update: "update".to_string(),
            update_bulk: "updatebulk".to_string(),
            checkout: "checkout".to_string(),
            copy: "copy".to_string(),
            move_: "move".to_string(),
            remove: "remove".to_string(),
            create_relation: "createRelation".to_string(),
            remove_relation: "removeRelation".to_string(),
            login: "login".to_string(),
        }
    }
}

/// The protocol differences between server families.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProtocolConfig {
    pub flavor: Flavor,
    /// Whether `update` may send `clearCheckoutState` alongside a new file.
    pub clear_checkout_state: bool,
    pub endpoints: Endpoints,
    /// Prefix of the path-based folder API, e.g. `"folder"`.
    pub folder_api_root: String,
}

impl ProtocolConfig {
    pub fn assets() -> Self {
        Self {
            flavor: Flavor::Assets,
            clear_checkout_state: true,
            endpoints: Endpoints::default(),
            folder_api_root: "folder".to_string(),
        }
    }

    pub fn elvis() -> Self {
        Self {
            flavor: Flavor::Elvis,
            clear_checkout_state: false,
            ..Self::assets()
        }
    }

    pub(crate) fn folder_path(&self, suffix: &str) -> String {
        let root = self.folder_api_root.trim_end_matches('/');
        if suffix.is_empty() {
            root.to_string()
        } else {
            format!("{root}/{suffix}")
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::assets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_differ_only_in_flavor_and_checkout_state() {
        let assets = ProtocolConfig::assets();
        let elvis = ProtocolConfig::elvis();
        assert!(assets.clear_checkout_state);
        assert!(!elvis.clear_checkout_state);
        assert_eq!(assets.endpoints, elvis.endpoints);
        assert_eq!(elvis.flavor, Flavor::Elvis);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ProtocolConfig =
            serde_json::from_str(r#"{"flavor":"elvis","endpoints":{"updateBulk":"bulkupdate"}}"#).unwrap();
        assert_eq!(config.flavor, Flavor::Elvis);
        assert_eq!(config.endpoints.update_bulk, "bulkupdate");
        assert_eq!(config.endpoints.search, "search");
        assert_eq!(config.folder_api_root, "folder");
        // defaults come from the Assets profile
        assert!(config.clear_checkout_state);
    }

    #[test]
    fn move_endpoint_uses_plain_key() {
        let config: ProtocolConfig = serde_json::from_str(r#"{"endpoints":{"move":"rename"}}"#).unwrap();
        assert_eq!(config.endpoints.move_, "rename");
    }

    #[test]
    fn folder_paths_join_under_root() {
        let config = ProtocolConfig::assets();
        assert_eq!(config.folder_path(""), "folder");
        assert_eq!(config.folder_path("get"), "folder/get");
        assert_eq!(config.folder_path("abc"), "folder/abc");
    }
}
