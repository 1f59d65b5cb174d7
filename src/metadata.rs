use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::ChartError;

/// Annotation naming the Rancher versions a chart supports.
pub const RANCHER_VERSION_ANNOTATION: &str = "catalog.cattle.io/rancher-version";
/// Annotation naming the Kubernetes versions a chart supports.
pub const KUBE_VERSION_ANNOTATION: &str = "catalog.cattle.io/kube-version";
/// Annotation hiding a chart from the catalog UI.
pub const HIDDEN_ANNOTATION: &str = "catalog.cattle.io/hidden";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Chart metadata as declared in `Chart.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Metadata {
    /// Decode manifest bytes.
    ///
    /// Fields are decoded one at a time so that a bad field does not discard
    /// the good ones: on failure the returned [`ChartError::Deserialize`]
    /// carries every field that did decode. Unknown keys are ignored and
    /// null values leave the field at its default.
    pub fn from_yaml(data: &[u8]) -> Result<Metadata, ChartError> {
        let mut metadata = Metadata::default();

        let document: Value = match serde_yaml::from_slice(data) {
            Ok(document) => document,
            Err(e) => return Err(deserialize_error(metadata, vec![e.to_string()])),
        };
        let mapping = match document {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(metadata),
            _ => {
                return Err(deserialize_error(
                    metadata,
                    vec!["expected a mapping at the top level".to_string()],
                ));
            }
        };

        let mut errors = Vec::new();
        for (key, value) in mapping {
            let Some(key) = key.as_str() else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let errors = &mut errors;
            match key {
                "apiVersion" => decode(key, value, &mut metadata.api_version, errors),
                "name" => decode(key, value, &mut metadata.name, errors),
                "version" => decode(key, value, &mut metadata.version, errors),
                "kubeVersion" => decode_opt(key, value, &mut metadata.kube_version, errors),
                "description" => decode_opt(key, value, &mut metadata.description, errors),
                "type" => decode_opt(key, value, &mut metadata.chart_type, errors),
                "keywords" => decode(key, value, &mut metadata.keywords, errors),
                "home" => decode_opt(key, value, &mut metadata.home, errors),
                "sources" => decode(key, value, &mut metadata.sources, errors),
                "dependencies" => decode(key, value, &mut metadata.dependencies, errors),
                "maintainers" => decode(key, value, &mut metadata.maintainers, errors),
                "icon" => decode_opt(key, value, &mut metadata.icon, errors),
                "appVersion" => decode_opt(key, value, &mut metadata.app_version, errors),
                "deprecated" => decode(key, value, &mut metadata.deprecated, errors),
                "annotations" => decode(key, value, &mut metadata.annotations, errors),
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(metadata)
        } else {
            Err(deserialize_error(metadata, errors))
        }
    }

    pub fn rancher_version(&self) -> Option<&str> {
        self.annotation(RANCHER_VERSION_ANNOTATION)
    }

    /// The kube-version catalog annotation, distinct from `kubeVersion`.
    pub fn catalog_kube_version(&self) -> Option<&str> {
        self.annotation(KUBE_VERSION_ANNOTATION)
    }

    pub fn is_hidden(&self) -> bool {
        self.annotation(HIDDEN_ANNOTATION) == Some("true")
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

fn decode<T: DeserializeOwned>(field: &str, value: Value, slot: &mut T, errors: &mut Vec<String>) {
    match serde_yaml::from_value(value) {
        Ok(decoded) => *slot = decoded,
        Err(e) => errors.push(format!("{}: {}", field, e)),
    }
}

fn decode_opt<T: DeserializeOwned>(
    field: &str,
    value: Value,
    slot: &mut Option<T>,
    errors: &mut Vec<String>,
) {
    match serde_yaml::from_value(value) {
        Ok(decoded) => *slot = Some(decoded),
        Err(e) => errors.push(format!("{}: {}", field, e)),
    }
}

fn deserialize_error(partial: Metadata, errors: Vec<String>) -> ChartError {
    ChartError::Deserialize {
        partial: Box::new(partial),
        reason: errors.join("; "),
    }
}
