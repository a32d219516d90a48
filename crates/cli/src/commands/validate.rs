use std::path::Path;
use std::process;

use crate::{report_error, OutputFormat};

static DOCUMENT_SCHEMA_STR: &str = include_str!("../../../../docs/document-schema.json");

const MODULE_PREFIX: &str = "export default ";

pub(crate) fn cmd_validate(doc_path: &Path, output: OutputFormat, quiet: bool) {
    let schema: serde_json::Value = match serde_json::from_str(DOCUMENT_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("internal error: failed to parse embedded document schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let doc_str = match std::fs::read_to_string(doc_path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", doc_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    // Accept `compile --module` output as well as bare JSON.
    let json_str = doc_str
        .trim_start()
        .strip_prefix(MODULE_PREFIX)
        .unwrap_or(&doc_str);
    let doc: serde_json::Value = match serde_json::from_str(json_str) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", doc_path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("internal error: failed to compile schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let errors: Vec<String> = validator
        .iter_errors(&doc)
        .map(|e| format!("{}", e))
        .collect();

    if errors.is_empty() {
        if !quiet {
            match output {
                OutputFormat::Text => println!("valid"),
                OutputFormat::Json => println!("{{\"valid\": true}}"),
            }
        }
        return;
    }

    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("invalid document");
                for err in &errors {
                    eprintln!("  - {}", err);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": false,
                "errors": errors
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
    process::exit(1);
}
