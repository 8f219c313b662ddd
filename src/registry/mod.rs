//! Async clients for package registries.
//!
//! Each ecosystem implements [`Registry`]: it fetches a package's version
//! index with per-version license and dependency data, and the package's
//! human-facing web page for the scraping fallback. Version selection
//! (explicit version, or the registry's latest) lives in
//! [`PackageDocument::select`] so every ecosystem falls back the same way.

pub mod npm;
pub mod pypi;

#[cfg(test)]
pub mod fake;

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use log::trace;
use reqwest::Client;
use serde_json::Value;

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::models::{Ecosystem, RequirementSpec};

pub trait Registry: Send + Sync + 'static {
    fn ecosystem(&self) -> Ecosystem;

    /// Key used for dedup; registries with case-insensitive names fold here.
    fn canonical_name(&self, name: &str) -> String {
        name.to_string()
    }

    /// Human-followable page for manual verification.
    fn details_url(&self, name: &str) -> String;

    /// Fetch the package's metadata. `version` is a hint; adapters that can
    /// only serve one version at a time use it, others return the full index.
    fn fetch_metadata(
        &self,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<PackageDocument, RegistryError>> + Send;

    /// Fetch the package's public web page as text.
    fn fetch_page(&self, name: &str) -> impl Future<Output = Result<String, RegistryError>> + Send;
}

/// Registry metadata for one package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageDocument {
    pub versions: HashMap<String, VersionMetadata>,
    /// The registry's "latest" version, if it publishes one.
    pub default_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionMetadata {
    /// License taken from structured metadata, if any.
    pub license: Option<String>,
    /// Declared direct runtime dependencies.
    pub dependencies: Vec<RequirementSpec>,
}

impl PackageDocument {
    /// Pick the version to use for `requested`.
    ///
    /// An empty request, or one missing from the index (a range, a yanked
    /// release, a dist-tag), falls back to the default version. The returned
    /// version string is always the one whose metadata is returned.
    pub fn select(&self, requested: &str) -> Option<(&str, &VersionMetadata)> {
        if !requested.is_empty() {
            if let Some((version, meta)) = self.versions.get_key_value(requested) {
                return Some((version.as_str(), meta));
            }
        }
        let latest = self.default_version.as_deref()?;
        self.versions
            .get_key_value(latest)
            .map(|(version, meta)| (version.as_str(), meta))
    }
}

/// Read a license from registry metadata.
///
/// Tried in order: `license` as a string, `license` as an object with a
/// `type` or `name` key, then the first element of a `licenses` array of
/// such objects (or strings). Blank values count as missing.
pub fn license_from_metadata(meta: &Value) -> Option<String> {
    if let Some(found) = meta.get("license").and_then(license_from_value) {
        return Some(found);
    }
    meta.get("licenses")
        .and_then(|l| l.as_array())
        .and_then(|arr| arr.first())
        .and_then(license_from_value)
}

fn license_from_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj
            .get("type")
            .and_then(|t| t.as_str())
            .filter(|t| !t.trim().is_empty())
            .or_else(|| obj.get("name").and_then(|n| n.as_str())),
        _ => None,
    }?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Build the HTTP client shared by every adapter.
pub fn build_client(cfg: &RegistryConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .user_agent(cfg.user_agent.clone())
        .build()?;
    Ok(client)
}

pub(crate) async fn get_json(client: &Client, url: &str) -> Result<Value, RegistryError> {
    trace!("GET {}", url);
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|source| RegistryError::Unavailable {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(RegistryError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| RegistryError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

pub(crate) async fn get_text(client: &Client, url: &str) -> Result<String, RegistryError> {
    trace!("GET {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| RegistryError::Unavailable {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(RegistryError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    response.text().await.map_err(|e| RegistryError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
