use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

/// Root configuration structure, deserialized from `.license-tree/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry endpoints and HTTP client settings.
    pub registry: RegistryConfig,
    /// Resolver scheduling.
    pub resolver: ResolverConfig,
    /// Web page license scraping.
    pub scrape: ScrapeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub npm_url: String,
    pub npm_page_url: String,
    pub pypi_url: String,
    pub pypi_page_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            npm_url: "https://registry.npmjs.org".to_string(),
            npm_page_url: "https://www.npmjs.com/package".to_string(),
            pypi_url: "https://pypi.org/pypi".to_string(),
            pypi_page_url: "https://pypi.org/project".to_string(),
            timeout_secs: 10,
            user_agent: concat!("license-tree/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum number of top-level requirements resolved at once, per ecosystem.
    pub concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig { concurrency: 16 }
    }
}

/// Controls the page-scraping fallback of license inference.
///
/// The scanner looks at every line containing "license" and the
/// `window_lines` lines following it; within that window the first entry
/// of `tokens` found (case-insensitively) is reported by its canonical name.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub window_lines: usize,
    pub tokens: Vec<LicenseToken>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LicenseToken {
    /// Text searched for in the page, case-insensitively.
    pub needle: String,
    /// Value reported when the needle is found.
    pub canonical: String,
}

impl LicenseToken {
    fn new(needle: &str, canonical: &str) -> Self {
        LicenseToken {
            needle: needle.to_string(),
            canonical: canonical.to_string(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        // More specific tokens come first: "BSD-3-Clause" must win over "BSD".
        let tokens = vec![
            LicenseToken::new("BSD-3-Clause", "BSD-3-Clause"),
            LicenseToken::new("BSD-2-Clause", "BSD-2-Clause"),
            LicenseToken::new("MIT", "MIT"),
            LicenseToken::new("ISC", "ISC"),
            LicenseToken::new("BSD", "BSD"),
            LicenseToken::new("Apache", "Apache"),
            LicenseToken::new("Artistic", "Artistic"),
            LicenseToken::new("Zlib", "Zlib"),
            LicenseToken::new("WTFPL", "WTFPL"),
            LicenseToken::new("CDDL", "CDDL"),
            LicenseToken::new("Unlicense", "Unlicense"),
            LicenseToken::new("EUPL", "EUPL"),
            LicenseToken::new("AGPL", "AGPL"),
            LicenseToken::new("LGPL", "LGPL"),
            LicenseToken::new("MPL", "MPL"),
            LicenseToken::new("CC0", "CC0"),
            LicenseToken::new("X11", "X11"),
        ];
        ScrapeConfig {
            window_lines: 10,
            tokens,
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`: path passed via `--config`
/// 2. `<project_path>/.license-tree/config.toml`
/// 3. `~/.config/license-tree/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".license-tree").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("license-tree").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    debug!("No config file found, using built-in defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    debug!("Loading config from {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
}
