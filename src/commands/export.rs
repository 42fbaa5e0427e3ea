//! `json` / `yaml`: convert an XML document to JSON or YAML
//!
//! The schema is built and the document decoded in lax mode, so documents
//! that do not fully conform still convert. What lax mode tolerated is
//! reported as warnings.

use std::fs;
use std::path::Path;

use super::{ExportParams, OperationError};
use crate::reporter::Reporter;
use crate::validators::{ValidationMode, XsdSchema};

/// Convert `params.xml` and write it to `params.output`
pub fn run(params: &ExportParams, reporter: &mut Reporter) -> Result<(), OperationError> {
    reporter.debug(format!("{:?}", params));
    export(params, reporter).map_err(|error| {
        error.report(reporter);
        error
    })
}

fn export(params: &ExportParams, reporter: &mut Reporter) -> Result<(), OperationError> {
    reporter.debug(format!("Schema: {}", params.schema.display()));
    let schema = XsdSchema::from_file_with_mode(&params.schema, ValidationMode::Lax)
        .map_err(|e| OperationError::SchemaLoad(e.to_string()))?;
    for defect in schema.build_errors() {
        reporter.warning(defect.to_string());
    }

    reporter.debug(format!("XML: {}", params.xml.display()));
    let (value, errors) = schema
        .decode_file(&params.xml, ValidationMode::Lax)
        .map_err(|e| OperationError::Decode(e.to_string()))?;
    for error in &errors {
        reporter.warning(error.to_string());
    }

    let text = params.format.serialize(&value)?;
    reporter.debug(&text);
    write_output(&params.output, &text, params.overwrite, reporter)
}

/// Write `text` to `path` unless it exists and `overwrite` is off
fn write_output(
    path: &Path,
    text: &str,
    overwrite: bool,
    reporter: &mut Reporter,
) -> Result<(), OperationError> {
    if path.exists() {
        if !overwrite {
            return Err(OperationError::OutputConflict(path.to_path_buf()));
        }
        reporter.warning(format!("overwriting {}", path.display()));
    }

    fs::write(path, text).map_err(|source| OperationError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}
