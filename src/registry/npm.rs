use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::models::{Ecosystem, RequirementSpec};

use super::{get_json, get_text, license_from_metadata, PackageDocument, Registry, VersionMetadata};

/// Client for the npm registry (`GET /{name}` returns every version).
pub struct NpmRegistry {
    client: Client,
    registry_url: String,
    page_url: String,
}

impl NpmRegistry {
    pub fn new(client: Client, cfg: &RegistryConfig) -> Self {
        Self {
            client,
            registry_url: cfg.npm_url.trim_end_matches('/').to_string(),
            page_url: cfg.npm_page_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Scoped packages need URL encoding: @scope/pkg → %40scope%2Fpkg
fn encode_name(name: &str) -> String {
    name.replace('@', "%40").replace('/', "%2F")
}

impl Registry for NpmRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }

    fn details_url(&self, name: &str) -> String {
        format!("{}/{}", self.page_url, name)
    }

    async fn fetch_metadata(&self, name: &str, _version: &str) -> Result<PackageDocument, RegistryError> {
        let url = format!("{}/{}", self.registry_url, encode_name(name));
        let data = get_json(&self.client, &url).await?;
        let document = parse_document(&data).ok_or_else(|| RegistryError::Malformed {
            url,
            reason: "response is not a JSON object".to_string(),
        })?;
        debug!(
            "npm {}: {} versions, latest {:?}",
            name,
            document.versions.len(),
            document.default_version
        );
        Ok(document)
    }

    async fn fetch_page(&self, name: &str) -> Result<String, RegistryError> {
        get_text(&self.client, &self.details_url(name)).await
    }
}

/// Turn an npm packument into a [`PackageDocument`].
fn parse_document(data: &Value) -> Option<PackageDocument> {
    let root = data.as_object()?;

    let default_version = root
        .get("dist-tags")
        .and_then(|d| d.get("latest"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let versions = root
        .get("versions")
        .and_then(|v| v.as_object())
        .map(|versions| {
            versions
                .iter()
                .map(|(version, meta)| (version.clone(), parse_version(meta)))
                .collect()
        })
        .unwrap_or_default();

    Some(PackageDocument {
        versions,
        default_version,
    })
}

fn parse_version(meta: &Value) -> VersionMetadata {
    let dependencies = meta
        .get("dependencies")
        .and_then(|d| d.as_object())
        .map(|deps| {
            deps.iter()
                .map(|(name, range)| RequirementSpec::new(name.clone(), range.as_str().unwrap_or("")))
                .collect()
        })
        .unwrap_or_default();

    VersionMetadata {
        license: license_from_metadata(meta),
        dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_scoped_name() {
        assert_eq!(encode_name("@types/node"), "%40types%2Fnode");
        assert_eq!(encode_name("left-pad"), "left-pad");
    }

    #[test]
    fn test_parse_document() {
        let data = json!({
            "name": "left-pad",
            "dist-tags": { "latest": "1.3.0" },
            "versions": {
                "1.2.0": { "license": { "type": "WTFPL" } },
                "1.3.0": {
                    "license": "WTFPL",
                    "dependencies": { "foo": "^2.0.0", "bar": "~1.1.0" }
                }
            }
        });

        let doc = parse_document(&data).unwrap();
        assert_eq!(doc.default_version.as_deref(), Some("1.3.0"));
        assert_eq!(doc.versions.len(), 2);

        let (version, meta) = doc.select("").unwrap();
        assert_eq!(version, "1.3.0");
        assert_eq!(meta.license.as_deref(), Some("WTFPL"));
        let mut names: Vec<&str> = meta.dependencies.iter().map(|d| d.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["bar", "foo"]);

        assert_eq!(
            doc.versions["1.2.0"].license.as_deref(),
            Some("WTFPL")
        );
        assert!(doc.versions["1.2.0"].dependencies.is_empty());
    }

    #[test]
    fn test_parse_document_without_versions() {
        let doc = parse_document(&json!({ "error": "not found" })).unwrap();
        assert!(doc.versions.is_empty());
        assert!(doc.select("1.0.0").is_none());
        assert!(parse_document(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_details_url() {
        let reg = NpmRegistry::new(Client::new(), &RegistryConfig::default());
        assert_eq!(
            reg.details_url("left-pad"),
            "https://www.npmjs.com/package/left-pad"
        );
    }
}
