//! In-memory [`Registry`] for tests.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::error::RegistryError;
use crate::models::{Ecosystem, RequirementSpec};

use super::{PackageDocument, Registry, VersionMetadata};

#[derive(Default)]
pub struct FakeRegistry {
    documents: HashMap<String, PackageDocument>,
    unavailable: Vec<String>,
    pages: HashMap<String, String>,
    metadata_calls: DashMap<String, usize>,
    page_calls: DashMap<String, usize>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `name@version`. The first version published becomes latest.
    pub fn with_package(
        mut self,
        name: &str,
        version: &str,
        license: Option<&str>,
        deps: &[(&str, &str)],
    ) -> Self {
        let doc = self.documents.entry(name.to_string()).or_default();
        doc.versions.insert(
            version.to_string(),
            VersionMetadata {
                license: license.map(str::to_string),
                dependencies: deps
                    .iter()
                    .map(|(n, v)| RequirementSpec::new(*n, *v))
                    .collect(),
            },
        );
        doc.default_version.get_or_insert_with(|| version.to_string());
        self
    }

    pub fn with_latest(mut self, name: &str, version: &str) -> Self {
        self.documents.entry(name.to_string()).or_default().default_version = Some(version.to_string());
        self
    }

    /// Every metadata request for `name` fails as if the registry were down.
    pub fn with_unavailable(mut self, name: &str) -> Self {
        self.unavailable.push(name.to_string());
        self
    }

    pub fn with_page(mut self, name: &str, page: &str) -> Self {
        self.pages.insert(name.to_string(), page.to_string());
        self
    }

    pub fn metadata_fetches(&self, name: &str) -> usize {
        self.metadata_calls.get(name).map(|c| *c).unwrap_or(0)
    }

    pub fn page_fetches(&self) -> usize {
        self.page_calls.iter().map(|c| *c.value()).sum()
    }
}

impl Registry for FakeRegistry {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }

    fn details_url(&self, name: &str) -> String {
        format!("https://registry.test/{}", name)
    }

    async fn fetch_metadata(&self, name: &str, _version: &str) -> Result<PackageDocument, RegistryError> {
        *self.metadata_calls.entry(name.to_string()).or_insert(0) += 1;
        // Let other tasks interleave, as a real network call would.
        tokio::task::yield_now().await;

        let url = format!("https://registry.test/api/{}", name);
        if self.unavailable.iter().any(|n| n == name) {
            return Err(RegistryError::Status { url, status: 503 });
        }
        self.documents
            .get(name)
            .cloned()
            .ok_or(RegistryError::Status { url, status: 404 })
    }

    async fn fetch_page(&self, name: &str) -> Result<String, RegistryError> {
        *self.page_calls.entry(name.to_string()).or_insert(0) += 1;
        tokio::task::yield_now().await;

        self.pages.get(name).cloned().ok_or(RegistryError::Status {
            url: self.details_url(name),
            status: 404,
        })
    }
}
