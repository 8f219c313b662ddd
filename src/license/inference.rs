use log::debug;

use crate::config::ScrapeConfig;
use crate::models::UNKNOWN_LICENSE;
use crate::registry::Registry;

/// Determine a package's license, never failing.
///
/// 1. `structured`: the license read from registry metadata, if non-blank.
/// 2. The package's web page, scanned with [`scrape_license`].
/// 3. `"Unknown"`.
pub async fn infer_license<R: Registry>(
    registry: &R,
    name: &str,
    structured: Option<&str>,
    scrape: &ScrapeConfig,
) -> String {
    if let Some(license) = structured.map(str::trim).filter(|l| !l.is_empty()) {
        return license.to_string();
    }

    debug!("No structured license for {}, scraping its page", name);
    match registry.fetch_page(name).await {
        Ok(page) => {
            if let Some(license) = scrape_license(&page, scrape) {
                debug!("Scraped license {} for {}", license, name);
                return license;
            }
            debug!("No license token on the page for {}", name);
        }
        Err(e) => debug!("Page fetch failed for {}: {}", name, e),
    }

    UNKNOWN_LICENSE.to_string()
}

/// Best-effort license detection in unstructured page text.
///
/// Every line containing "license" (case-insensitively) opens a window of
/// that line plus the next `window_lines` lines. Windows are examined in
/// document order, line by line, and within a line the configured tokens
/// are tried in order; the first hit's canonical name is returned.
pub fn scrape_license(page: &str, cfg: &ScrapeConfig) -> Option<String> {
    let lines: Vec<String> = page.lines().map(str::to_uppercase).collect();
    let needles: Vec<(String, &str)> = cfg
        .tokens
        .iter()
        .filter(|t| !t.needle.is_empty())
        .map(|t| (t.needle.to_uppercase(), t.canonical.as_str()))
        .collect();

    let match_line = |line: &str| {
        needles
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, canonical)| canonical.to_string())
    };

    for (start, line) in lines.iter().enumerate() {
        if !line.contains("LICENSE") {
            continue;
        }
        let end = start.saturating_add(cfg.window_lines).min(lines.len() - 1);
        if let Some(found) = lines[start..=end].iter().find_map(|l| match_line(l)) {
            return Some(found);
        }
    }

    None
}
