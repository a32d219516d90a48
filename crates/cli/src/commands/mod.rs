pub(crate) mod check;
pub(crate) mod clean;
pub(crate) mod compile;
pub(crate) mod validate;

use std::path::Path;
use std::process;

use connect_core::CompileError;

use crate::OutputFormat;

/// Print a compile error and exit 1.
pub(crate) fn fail_compile(e: &CompileError, output: OutputFormat, quiet: bool) -> ! {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("{}", e);
            }
        }
    }
    process::exit(1);
}

/// Write `contents` to `path`, or to stdout when `path` is `-`.
///
/// The file is written to a temporary sibling and renamed into place, so an
/// existing output is never left half-written.
pub(crate) fn write_output(path: &Path, contents: &str) -> Result<(), String> {
    if path == Path::new("-") {
        println!("{}", contents);
        return Ok(());
    }
    let write_err = |e: std::io::Error| format!("error writing '{}': {}", path.display(), e);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    std::io::Write::write_all(&mut tmp, contents.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
