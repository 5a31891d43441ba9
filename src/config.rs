// Configuration file handling.
// The config is a small TOML document that lives in the user's config
// directory (see `Config::default_path`). It is read once at startup and
// rewritten immediately whenever the API key is set or prompted for.

use crate::error::{ConfigError, SIGNUP_URL};
use dialoguer::Input;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Default endpoint for the v2 query API.
pub const DEFAULT_API_URL: &str = "https://api.wolframalpha.com/v2/query";

/// Flat configuration record. Every field has a default so that a partial
/// file (for example one with only `api_key`) still loads.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    /// Ask the API for images and offer them through `:p N`.
    pub fetch_pics: bool,
    /// Print the wolframalpha.com link for the query below each result.
    pub show_url: bool,
    pub api_url: String,
    pub picture_viewer: ViewerKind,
    pub colors: Colors,
}

/// Color names for pod and subpod titles, e.g. `GREEN` or `LIGHTBLUE_EX`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Colors {
    pub pod: String,
    pub subpod: String,
}

/// How `:p N` shows a picture.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewerKind {
    /// Save to a temp file and hand it to the platform's default viewer.
    #[default]
    External,
    /// Draw it in the terminal (iTerm2 inline image protocol).
    Inline,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            fetch_pics: false,
            show_url: true,
            api_url: DEFAULT_API_URL.to_string(),
            picture_viewer: ViewerKind::default(),
            colors: Colors::default(),
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Colors {
            pod: "GREEN".to_string(),
            subpod: "BLUE".to_string(),
        }
    }
}

impl Config {
    /// `<config dir>/wolframalpha-cli/config.toml`, e.g.
    /// `~/.config/wolframalpha-cli/config.toml` on Linux.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("wolframalpha-cli").join("config.toml"))
    }

    /// Load the config at `path`. A missing file is not an error: it yields
    /// the defaults with an empty API key, which `ensure_api_key` then fills.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::ReadFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rewrite the whole file at `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, text).map_err(write_err)?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Store `key` in the config file at `path`, keeping every other setting.
/// A file that no longer parses is replaced by the defaults plus the key.
pub fn set_api_key(path: &Path, key: &str) -> Result<Config, ConfigError> {
    let mut config = match Config::load(path) {
        Ok(config) => config,
        Err(err @ ConfigError::Parse { .. }) => {
            warn!(error = %err, "replacing unparsable config with defaults");
            Config::default()
        }
        Err(err) => return Err(err),
    };
    config.api_key = key.trim().to_string();
    config.save(path)?;
    Ok(config)
}

/// Prompt for an API key when the config has none and persist it right away.
/// Does nothing when a key is already present.
pub fn ensure_api_key(config: &mut Config, path: &Path) -> anyhow::Result<()> {
    if config.has_api_key() {
        return Ok(());
    }

    println!("It seems you don't have an API key yet.\nGet one at {SIGNUP_URL}");
    let key: String = Input::new()
        .with_prompt("WolframAlpha API key")
        .interact_text()?;
    config.api_key = key.trim().to_string();
    config.save(path)?;
    Ok(())
}

/// Open the config file in the user's editor and wait for it to exit.
/// A default config is written first if the file doesn't exist yet.
pub fn open_in_editor(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        Config::default().save(path)?;
    }

    let editor = editor_command();
    debug!(%editor, path = %path.display(), "launching editor");
    let status = Command::new(&editor)
        .arg(path)
        .status()
        .map_err(|e| ConfigError::Editor {
            editor: editor.clone(),
            reason: e.to_string(),
        })?;

    if !status.success() {
        return Err(ConfigError::Editor {
            editor,
            reason: status.to_string(),
        });
    }
    Ok(())
}

/// `$VISUAL`, then `$EDITOR`, then a platform default.
fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "vim".to_string()
            }
        })
}
