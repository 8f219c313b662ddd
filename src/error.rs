use thiserror::Error;

use crate::models::Ecosystem;

/// Failure talking to a package registry or package web page.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry unavailable at {url}: {source}")]
    Unavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::Status { status: 404, .. })
    }
}

/// A package that could not be resolved, kept for diagnostics.
#[derive(Debug, Error)]
#[error("{ecosystem} package {name}@{version}: {source}")]
pub struct ResolveError {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
    #[source]
    pub source: RegistryError,
}
