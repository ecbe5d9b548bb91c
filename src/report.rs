//! JSON and HTML reports for a run.
//!
//! Both are pure functions of the record set and run context; the `write_*`
//! variants just put the result at the path the context prescribes.

use askama::Template;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{Record, RecordSet, RunContext};
use crate::utils::error::{AppError, Result};

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    site_id: &'a str,
    timestamp: &'a str,
    run_source: &'a str,
    json: &'a str,
    products: &'a [Record],
}

/// Serializes the record set with four-space indentation.
pub fn to_pretty_json(records: &RecordSet) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;
    buf.push(b'\n');

    String::from_utf8(buf).map_err(|e| AppError::Serialization(serde::ser::Error::custom(e)))
}

pub async fn write_json(records: &RecordSet, ctx: &RunContext) -> Result<PathBuf> {
    let path = ctx.json_path();
    let json = to_pretty_json(records)?;
    write_file(&path, &json).await?;

    info!("JSON file saved: {}", path.display());
    Ok(path)
}

/// Renders the static report. Every interpolated value is HTML-escaped.
pub fn render_html(records: &RecordSet, ctx: &RunContext, run_source: &str) -> Result<String> {
    let json = to_pretty_json(records)?;
    let template = ReportTemplate {
        site_id: &ctx.site_id,
        timestamp: &ctx.timestamp,
        run_source,
        json: json.trim_end(),
        products: &records.products,
    };

    Ok(template.render()?)
}

pub async fn write_html(records: &RecordSet, ctx: &RunContext, run_source: &str) -> Result<PathBuf> {
    let path = ctx.html_path();
    let html = render_html(records, ctx, run_source)?;
    write_file(&path, &html).await?;

    info!("HTML file generated: {}", path.display());
    Ok(path)
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| AppError::storage(path, e))
}
