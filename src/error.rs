use std::path::PathBuf;

/// Errors that can occur while rendering the listing page
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid target URL {0}: {1}")]
    InvalidUrl(String, String),

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Tab creation failed: {0}")]
    Tab(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("HTML capture failed: {0}")]
    Capture(String),

    #[error("Failed to save debug artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single listing node was skipped during extraction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseNodeError {
    #[error("listing has no title")]
    MissingTitle,

    #[error("listing has no company")]
    MissingCompany,

    #[error("listing has no link anchor")]
    MissingLink,

    #[error("link anchor has no href")]
    MissingHref,
}

/// Errors from the CSV file sink
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors from the spreadsheet sink
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Could not load service account credentials from {path:?}: {reason}")]
    Credentials { path: PathBuf, reason: String },

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    #[error("Spreadsheet {0} has no worksheets")]
    NoWorksheet(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Errors while loading the TOML configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
