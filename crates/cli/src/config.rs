//! Layered settings: defaults, then `connect-maker.toml`, then the
//! environment, then command-line flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use connect_media::DEFAULT_IMAGE_SIZE;

pub(crate) const CONFIG_FILE: &str = "connect-maker.toml";

pub(crate) const ENV_CACHE_DIR: &str = "CONNECT_MAKER_CACHE_DIR";
pub(crate) const ENV_FFMPEG: &str = "CONNECT_MAKER_FFMPEG";
pub(crate) const ENV_YT_DLP: &str = "CONNECT_MAKER_YT_DLP";
pub(crate) const ENV_USER_AGENT: &str = "CONNECT_MAKER_USER_AGENT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub cache_dir: PathBuf,
    pub output: PathBuf,
    pub ffmpeg: PathBuf,
    pub yt_dlp: PathBuf,
    pub user_agent: String,
    pub image_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_dir: PathBuf::from("./cache"),
            output: PathBuf::from("out.json"),
            ffmpeg: PathBuf::from("ffmpeg"),
            yt_dlp: PathBuf::from("yt-dlp"),
            user_agent: format!("connect-maker/{}", env!("CARGO_PKG_VERSION")),
            image_size: DEFAULT_IMAGE_SIZE,
        }
    }
}

/// `connect-maker.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    cache_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
    yt_dlp: Option<PathBuf>,
    user_agent: Option<String>,
    image_size: Option<u32>,
}

/// Per-invocation overrides taken from flags.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub cache_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub image_size: Option<u32>,
}

impl Config {
    /// Load settings. An explicit `path` must exist; the default
    /// `connect-maker.toml` is optional.
    pub(crate) fn load(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Result<Config, String> {
        let mut config = Config::default();

        let file = match path {
            Some(path) => Some(read_file(path)?),
            None if Path::new(CONFIG_FILE).is_file() => Some(read_file(Path::new(CONFIG_FILE))?),
            None => None,
        };
        if let Some(file) = file {
            config.apply_file(file);
        }

        config.apply_env(env);

        if let Some(dir) = overrides.cache_dir {
            config.cache_dir = dir;
        }
        if let Some(output) = overrides.output {
            config.output = output;
        }
        if let Some(size) = overrides.image_size {
            config.image_size = size;
        }

        if config.image_size == 0 {
            return Err("image_size must be greater than zero".to_owned());
        }
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.cache_dir {
            self.cache_dir = v;
        }
        if let Some(v) = file.output {
            self.output = v;
        }
        if let Some(v) = file.ffmpeg {
            self.ffmpeg = v;
        }
        if let Some(v) = file.yt_dlp {
            self.yt_dlp = v;
        }
        if let Some(v) = file.user_agent {
            self.user_agent = v;
        }
        if let Some(v) = file.image_size {
            self.image_size = v;
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| env(name).filter(|v| !v.is_empty());
        if let Some(v) = var(ENV_CACHE_DIR) {
            self.cache_dir = v.into();
        }
        if let Some(v) = var(ENV_FFMPEG) {
            self.ffmpeg = v.into();
        }
        if let Some(v) = var(ENV_YT_DLP) {
            self.yt_dlp = v.into();
        }
        if let Some(v) = var(ENV_USER_AGENT) {
            self.user_agent = v;
        }
    }
}

fn read_file(path: &Path) -> Result<FileConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading config '{}': {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("error parsing config '{}': {}", path.display(), e))
}

/// Reads the process environment.
pub(crate) fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
