use std::{io::Write, path::Path};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use tracing::info;

use flatmeta_utils::fs::write_replace;

use crate::{error::ErrorContext, projection::ProjectedMetadata, Result};

/// One element of the report array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    #[serde(rename = "ref")]
    pub reference: String,
    pub metadata: Option<ProjectedMetadata>,
    pub manifest: Option<Value>,
}

/// Serializes `entries` as a JSON array indented by four spaces, newline terminated.
pub fn assemble(entries: &[ReportEntry]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    entries.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Writes the report to `output`, or to stdout when `None`.
pub fn write_report(entries: &[ReportEntry], output: Option<&Path>) -> Result<()> {
    let json = assemble(entries)?;

    match output {
        Some(path) => {
            write_replace(path, &json)?;
            info!("Wrote {} entries to {}", entries.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&json)
                .with_context(|| "writing report to stdout".to_string())?;
            stdout
                .flush()
                .with_context(|| "flushing stdout".to_string())?;
        }
    }

    Ok(())
}
