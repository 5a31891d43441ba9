// Error types shared by the library modules.
// - `ConfigError` covers everything that can go wrong with the config file.
//   These are fatal at startup.
// - `QueryError` covers a single query round trip (HTTP + XML). These are
//   reported in place of the query output and never stop the REPL.

use std::path::PathBuf;

/// Where to send users that don't have an API key yet.
pub const SIGNUP_URL: &str = "https://developer.wolframalpha.com/portal/apisignup.html";

/// Errors raised while reading, writing or editing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file could not be written.
    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has fields of the wrong type.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Neither `--config-file` nor a platform config directory is available.
    #[error("could not determine a config directory; pass --config-file")]
    NoConfigDir,

    /// The editor could not be started or exited unsuccessfully.
    #[error("editor '{editor}' failed: {reason}")]
    Editor { editor: String, reason: String },
}

/// Errors raised while running one query against the API.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Transport failure: DNS, connect, TLS, body read...
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}")]
    Status { status: reqwest::StatusCode },

    #[error("invalid XML in response: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid XML attribute in response: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    /// The body had no root element at all (e.g. a plain-text error page).
    #[error("response contains no XML document")]
    EmptyDocument,

    /// The body ended while `element` was still open.
    #[error("response ended inside <{element}>")]
    Truncated { element: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
