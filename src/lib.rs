//! Structured data extractor
//!
//! Fetches pages and pulls out embedded structured data:
//! - JSON-LD (script blocks, arrays and @graph containers)
//! - Microdata (schema.org itemscope/itemprop)
//! - RDFa (vocab/typeof/property, OpenGraph meta tags)
//!
//! Every item is flattened into `(url, syntax, item_index, item_type,
//! property, value)` rows with reconstructable property paths such as
//! `offers[0].price`, ready for export to a spreadsheet.

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod extractors;
pub mod fetch;
pub mod flatten;
pub mod normalize;
pub mod pipeline;
pub mod value;

pub use classify::item_type;
pub use config::RunConfig;
pub use error::{BatchError, ConfigError, ExportError, ExtractError, FetchError, ParseError};
pub use export::{preview, write_workbook, EXPORT_FILE_NAME, EXPORT_MIME_TYPE, PREVIEW_ROWS};
pub use fetch::{Fetch, FetchedPage, HttpFetcher};
pub use flatten::{flatten, flatten_item, PathValue};
pub use normalize::{normalize_items, Syntax, SyntaxResultSet};
pub use pipeline::{
    parse_url_list, process_url, run_batch, BatchProgress, BatchReport, FlatRow, PerUrlSummary,
    UrlExtraction,
};
pub use value::{ItemValue, Scalar};
