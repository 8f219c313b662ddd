use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::analyzer::python::split_dependency;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::models::{Ecosystem, RequirementSpec};

use super::{get_json, get_text, PackageDocument, Registry, VersionMetadata};

/// Client for the PyPI JSON API.
///
/// PyPI serves one version per document, so an explicit version is fetched
/// from `/{name}/{version}/json` and anything else (or a 404 for that
/// version) from `/{name}/json`, which describes the latest release.
pub struct PypiRegistry {
    client: Client,
    registry_url: String,
    page_url: String,
}

impl PypiRegistry {
    pub fn new(client: Client, cfg: &RegistryConfig) -> Self {
        Self {
            client,
            registry_url: cfg.pypi_url.trim_end_matches('/').to_string(),
            page_url: cfg.pypi_page_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Registry for PypiRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn canonical_name(&self, name: &str) -> String {
        normalize_name(name)
    }

    fn details_url(&self, name: &str) -> String {
        format!("{}/{}/", self.page_url, name)
    }

    async fn fetch_metadata(&self, name: &str, version: &str) -> Result<PackageDocument, RegistryError> {
        if !version.is_empty() {
            let url = format!("{}/{}/{}/json", self.registry_url, name, version);
            match get_json(&self.client, &url).await {
                Ok(data) => return parse_document(&url, &data),
                Err(e) if e.is_not_found() => {
                    debug!("PyPI has no {}=={}, using latest release", name, version);
                }
                Err(e) => return Err(e),
            }
        }

        let url = format!("{}/{}/json", self.registry_url, name);
        let data = get_json(&self.client, &url).await?;
        parse_document(&url, &data)
    }

    async fn fetch_page(&self, name: &str) -> Result<String, RegistryError> {
        get_text(&self.client, &self.details_url(name)).await
    }
}

/// PEP 503 normalization: case-insensitive, runs of `-`, `_`, `.` are equal.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut after_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !after_separator {
                normalized.push('-');
            }
            after_separator = true;
        } else {
            normalized.extend(c.to_lowercase());
            after_separator = false;
        }
    }
    normalized
}

fn parse_document(url: &str, data: &Value) -> Result<PackageDocument, RegistryError> {
    let info = data.get("info").ok_or_else(|| RegistryError::Malformed {
        url: url.to_string(),
        reason: "missing `info` object".to_string(),
    })?;
    let version = info
        .get("version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RegistryError::Malformed {
            url: url.to_string(),
            reason: "missing `info.version`".to_string(),
        })?
        .to_string();

    let meta = VersionMetadata {
        license: license_from_info(info),
        dependencies: runtime_dependencies(info),
    };

    Ok(PackageDocument {
        versions: [(version.clone(), meta)].into_iter().collect(),
        default_version: Some(version),
    })
}

/// `license_expression`, then `license`, then the first license classifier.
fn license_from_info(info: &Value) -> Option<String> {
    let non_blank = |key: &str| {
        info.get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    if let Some(expr) = non_blank("license_expression") {
        return Some(expr.to_string());
    }

    // Some projects paste the whole license text; the first line names it.
    if let Some(license) = non_blank("license") {
        let first_line = license.lines().next().unwrap_or(license).trim();
        if !first_line.is_empty() {
            return Some(first_line.to_string());
        }
    }

    info.get("classifiers")
        .and_then(|c| c.as_array())
        .into_iter()
        .flatten()
        .filter_map(|c| c.as_str())
        .find(|c| c.starts_with("License ::"))
        .and_then(|c| c.rsplit("::").next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse `requires_dist`, skipping anything only pulled in by an extra.
fn runtime_dependencies(info: &Value) -> Vec<RequirementSpec> {
    let Some(requires) = info.get("requires_dist").and_then(|r| r.as_array()) else {
        return Vec::new();
    };

    requires
        .iter()
        .filter_map(|r| r.as_str())
        .filter_map(|entry| {
            let (requirement, marker) = match entry.split_once(';') {
                Some((req, marker)) => (req.trim(), marker),
                None => (entry.trim(), ""),
            };
            if marker.contains("extra") {
                return None;
            }
            split_dependency(requirement)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use crate::resolver::Resolver;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry_at(server: &MockServer) -> PypiRegistry {
        let cfg = RegistryConfig {
            pypi_url: server.uri(),
            pypi_page_url: format!("{}/project", server.uri()),
            ..RegistryConfig::default()
        };
        PypiRegistry::new(Client::new(), &cfg)
    }

    fn release(version: &str) -> Value {
        json!({ "info": { "version": version, "license": "BSD-3-Clause", "requires_dist": null } })
    }

    #[tokio::test]
    async fn test_missing_version_falls_back_to_latest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flask/9.9.9/json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flask/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release("2.0.1")))
            .mount(&server)
            .await;

        let doc = registry_at(&server).fetch_metadata("flask", "9.9.9").await.unwrap();
        let (version, meta) = doc.select("9.9.9").unwrap();
        assert_eq!(version, "2.0.1");
        assert_eq!(meta.license.as_deref(), Some("BSD-3-Clause"));

        let resolution = Resolver::new(registry_at(&server), ScrapeConfig::default(), 2)
            .resolve(vec![RequirementSpec::new("flask", "9.9.9")])
            .await;
        assert!(resolution.errors.is_empty());
        assert_eq!(resolution.forest[0].resolved_version, "2.0.1");
        assert_eq!(resolution.forest[0].requested_version, "9.9.9");
    }

    #[tokio::test]
    async fn test_exact_version_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flask/2.0.1/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release("2.0.1")))
            .expect(1)
            .mount(&server)
            .await;

        let doc = registry_at(&server).fetch_metadata("flask", "2.0.1").await.unwrap();
        assert_eq!(doc.default_version.as_deref(), Some("2.0.1"));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried_as_latest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flask/2.0.1/json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flask/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release("2.0.1")))
            .expect(0)
            .mount(&server)
            .await;

        let err = registry_at(&server)
            .fetch_metadata("flask", "2.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Status { status: 503, .. }));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Flask"), "flask");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("typing__extensions"), "typing-extensions");
    }

    #[test]
    fn test_parse_document() {
        let data = json!({
            "info": {
                "name": "Flask",
                "version": "2.0.1",
                "license": "BSD-3-Clause",
                "requires_dist": [
                    "Werkzeug (>=2.0)",
                    "Jinja2>=3.0",
                    "itsdangerous>=2.0",
                    "click>=7.1.2",
                    "asgiref>=3.2 ; extra == 'async'",
                    "python-dotenv ; extra == 'dotenv'"
                ]
            }
        });

        let doc = parse_document("u", &data).unwrap();
        let (version, meta) = doc.select("2.0.1").unwrap();
        assert_eq!(version, "2.0.1");
        assert_eq!(meta.license.as_deref(), Some("BSD-3-Clause"));
        assert_eq!(
            meta.dependencies,
            vec![
                RequirementSpec::new("Werkzeug", "2.0"),
                RequirementSpec::new("Jinja2", "3.0"),
                RequirementSpec::new("itsdangerous", "2.0"),
                RequirementSpec::new("click", "7.1.2"),
            ]
        );
    }

    #[test]
    fn test_unpinned_and_marker_dependencies() {
        let info = json!({
            "requires_dist": [
                "idna",
                "charset-normalizer<4,>=2",
                "importlib-metadata>=3.6 ; python_version < \"3.10\""
            ]
        });
        assert_eq!(
            runtime_dependencies(&info),
            vec![
                RequirementSpec::new("idna", ""),
                RequirementSpec::new("charset-normalizer", ""),
                RequirementSpec::new("importlib-metadata", "3.6"),
            ]
        );
        assert!(runtime_dependencies(&json!({ "requires_dist": null })).is_empty());
    }

    #[test]
    fn test_license_priority() {
        let info = json!({
            "license_expression": "Apache-2.0",
            "license": "Apache License",
            "classifiers": ["License :: OSI Approved :: MIT License"]
        });
        assert_eq!(license_from_info(&info), Some("Apache-2.0".to_string()));

        let full_text = json!({ "license": "MIT License\n\nCopyright (c) 2020 ..." });
        assert_eq!(license_from_info(&full_text), Some("MIT License".to_string()));

        let classifier_only = json!({
            "license": "",
            "classifiers": [
                "Programming Language :: Python",
                "License :: OSI Approved :: GNU General Public License v3 (GPLv3)"
            ]
        });
        assert_eq!(
            license_from_info(&classifier_only),
            Some("GNU General Public License v3 (GPLv3)".to_string())
        );

        assert_eq!(license_from_info(&json!({ "license": null })), None);
    }

    #[test]
    fn test_missing_info_is_malformed() {
        let err = parse_document("https://pypi.org/pypi/x/json", &json!({})).unwrap_err();
        assert!(matches!(err, RegistryError::Malformed { .. }));
    }
}
