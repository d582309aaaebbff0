//! Error types

use thiserror::Error;

/// Failure while retrieving a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {code} for {url}")]
    Status { code: u16, url: String },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to read {url}: {message}")]
    Body { url: String, message: String },
}

/// Failure while pulling structured data out of fetched markup
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON-LD in block {block}: {message}")]
    JsonLd { block: usize, message: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Anything that can go wrong processing a single URL
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Timeout must be between {min} and {max} seconds, got {value}")]
    TimeoutOutOfRange { value: u64, min: u64, max: u64 },

    #[error("Delay must be between {min} and {max} seconds, got {value}")]
    DelayOutOfRange { value: f64, min: f64, max: f64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("No URLs provided")]
    NoUrls,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to build workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
