//! `chk`: validate an XML document against an XML Schema

use super::{CheckParams, OperationError};
use crate::reporter::Reporter;
use crate::validators::XsdSchema;

/// Validate `params.xml` against `params.schema`
///
/// Prints `XML Schema valid!` on success. On failure the cause is reported
/// and returned.
pub fn run(params: &CheckParams, reporter: &mut Reporter) -> Result<(), OperationError> {
    reporter.debug(format!("{:?}", params));
    match check(params, reporter) {
        Ok(()) => {
            reporter.info("XML Schema valid!");
            Ok(())
        }
        Err(error) => {
            error.report(reporter);
            Err(error)
        }
    }
}

fn check(params: &CheckParams, reporter: &mut Reporter) -> Result<(), OperationError> {
    reporter.debug(format!("Schema: {}", params.schema.display()));
    let schema = XsdSchema::from_file(&params.schema)
        .map_err(|e| OperationError::SchemaLoad(e.to_string()))?;

    reporter.debug(format!("XML: {}", params.xml.display()));
    let errors = schema
        .iter_errors_file(&params.xml)
        .map_err(|e| OperationError::Validation(e.to_string()))?;
    if errors.is_empty() {
        return Ok(());
    }

    log::debug!("{} validation error(s) in {}", errors.len(), params.xml.display());
    let detail = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n\n");
    Err(OperationError::Validation(detail))
}
