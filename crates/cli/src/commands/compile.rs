use std::path::{Path, PathBuf};
use std::process;

use connect_core::{Document, FileSystemProvider};
use connect_media::{AudioResolver, CachingResolver, DiskCache, ImageResolver};

use crate::commands::{fail_compile, write_output};
use crate::config::Config;
use crate::{report_error, OutputFormat};

pub(crate) struct CompileArgs {
    pub file: PathBuf,
    pub module: bool,
    pub pretty: bool,
}

pub(crate) fn cmd_compile(args: &CompileArgs, config: &Config, output: OutputFormat, quiet: bool) {
    let resolver = CachingResolver::new(
        DiskCache::new(&config.cache_dir),
        Box::new(FileSystemProvider),
        script_dir(&args.file),
        ImageResolver::new(config.image_size, config.user_agent.clone()),
        AudioResolver::new(&config.ffmpeg, &config.yt_dlp),
    );

    let doc = match connect_core::compile(&args.file, &resolver) {
        Ok(doc) => doc,
        Err(e) => fail_compile(&e, output, quiet),
    };

    let rendered = match render(&doc, args.pretty, args.module) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("serialization error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    if let Err(msg) = write_output(&config.output, &rendered) {
        report_error(&msg, output, quiet);
        process::exit(1);
    }
    tracing::info!(
        output = %config.output.display(),
        cache_hits = resolver.hits(),
        cache_misses = resolver.misses(),
        "document written"
    );
}

/// Directory local media references are resolved against.
fn script_dir(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Serialize the document, optionally as an ES module default export.
pub(crate) fn render(doc: &Document, pretty: bool, module: bool) -> Result<String, serde_json::Error> {
    let json = if pretty {
        doc.to_json_pretty()?
    } else {
        doc.to_json()?
    };
    Ok(if module {
        format!("export default {}", json)
    } else {
        json
    })
}
