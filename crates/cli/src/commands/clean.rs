use std::process;

use connect_media::DiskCache;

use crate::config::Config;
use crate::{report_error, OutputFormat};

/// Remove the content cache directory.
pub(crate) fn cmd_clean(config: &Config, output: OutputFormat, quiet: bool) {
    let cache = DiskCache::new(&config.cache_dir);
    if let Err(e) = cache.clear() {
        report_error(&e.to_string(), output, quiet);
        process::exit(1);
    }
    tracing::info!(dir = %cache.dir().display(), "cache removed");
    if !quiet {
        match output {
            OutputFormat::Text => println!("removed {}", cache.dir().display()),
            OutputFormat::Json => {
                let json = serde_json::json!({ "removed": cache.dir().display().to_string() });
                println!("{}", json);
            }
        }
    }
}
