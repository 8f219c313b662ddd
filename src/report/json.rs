use anyhow::Result;
use serde::Serialize;

use crate::models::{FlatDependencyRecord, LicenseRisk, TreeDocument};

use super::Report;

#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(flatten)]
    record: &'a FlatDependencyRecord,
    risk: LicenseRisk,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    dependencies: Vec<JsonRecord<'a>>,
    trees: &'a [TreeDocument],
    unresolved: usize,
}

/// Serialize the report as pretty-printed JSON.
pub fn render(report: &Report) -> Result<String> {
    let doc = JsonReport {
        dependencies: report
            .records
            .iter()
            .map(|record| JsonRecord {
                record,
                risk: record.risk(),
            })
            .collect(),
        trees: &report.trees,
        unresolved: report.unresolved,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}
