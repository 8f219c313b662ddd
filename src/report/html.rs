use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{LicenseRisk, TreeDocument};

use super::Report;

const STYLE: &str = r#"body{font-family:Arial,sans-serif;margin:20px;}
h1,h2{color:#2c3e50;}
table{width:100%;border-collapse:collapse;margin-bottom:20px;}
th,td{border:1px solid #ddd;padding:8px;text-align:left;}
th{background:#f2f2f2;}
.copyleft{background:#f8d7da;color:#721c24;}
.non-copyleft{background:#d4edda;color:#155724;}
.unknown{background:#ffff99;color:#333;}
details{margin:4px 0;}
summary{cursor:pointer;font-weight:bold;}
"#;

/// Render the report as a standalone HTML page.
///
/// The tree documents are also embedded verbatim as JSON in a
/// `<script id="dependency-trees">` block for client-side tree viewers.
pub fn render(report: &Report) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">")?;
    writeln!(out, "<title>Dependency License Report</title>")?;
    writeln!(out, "<style>\n{}</style>\n</head>\n<body>", STYLE)?;
    writeln!(out, "<h1>Dependency License Report</h1>")?;

    writeln!(out, "<h2>Summary</h2>")?;
    writeln!(out, "<p>{}</p>", escape(&report.headline()))?;
    if report.unresolved > 0 {
        writeln!(
            out,
            "<p>{} package(s) could not be fetched from their registry and are not listed.</p>",
            report.unresolved
        )?;
    }

    writeln!(out, "<h2>Dependencies Table</h2>\n<table>")?;
    writeln!(
        out,
        "<tr><th>Name</th><th>Version</th><th>License</th><th>Parent</th><th>Language</th><th>Details</th></tr>"
    )?;
    for record in &report.records {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>{}</td><td><a href=\"{}\">{}</a></td></tr>",
            escape(&record.name),
            escape(&record.version),
            risk_class(record.risk()),
            escape(&record.license),
            escape(&record.parent),
            record.ecosystem,
            escape(&record.details_url),
            escape(&record.details_url),
        )?;
    }
    writeln!(out, "</table>")?;

    for tree in &report.trees {
        writeln!(out, "<h2>{}</h2>\n<div>", escape(&tree.name))?;
        if tree.children.is_empty() {
            writeln!(out, "<p>No dependencies found.</p>")?;
        }
        for child in &tree.children {
            write_tree(&mut out, child)?;
        }
        writeln!(out, "</div>")?;
    }

    let trees_json = serde_json::to_string(&report.trees)?.replace("</", "<\\/");
    writeln!(
        out,
        "<script type=\"application/json\" id=\"dependency-trees\">{}</script>",
        trees_json
    )?;
    writeln!(out, "</body>\n</html>")?;

    Ok(out)
}

/// Render and write the page to `path`.
pub fn write(report: &Report, path: &Path) -> Result<()> {
    let page = render(report)?;
    std::fs::write(path, page).with_context(|| format!("failed to write {}", path.display()))
}

fn write_tree(out: &mut String, node: &TreeDocument) -> std::fmt::Result {
    let summary = format!(
        "{}@{} (License: {})",
        node.name,
        node.version.as_deref().unwrap_or(""),
        node.license.as_deref().unwrap_or("")
    );
    writeln!(out, "<details><summary>{}</summary>", escape(&summary))?;
    if !node.children.is_empty() {
        writeln!(out, "<ul>")?;
        for child in &node.children {
            write!(out, "<li>")?;
            write_tree(out, child)?;
            writeln!(out, "</li>")?;
        }
        writeln!(out, "</ul>")?;
    }
    writeln!(out, "</details>")
}

fn risk_class(risk: LicenseRisk) -> &'static str {
    match risk {
        LicenseRisk::Copyleft => "copyleft",
        LicenseRisk::Permissive => "non-copyleft",
        LicenseRisk::Unknown => "unknown",
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
