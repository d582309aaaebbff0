//! Per-URL orchestration and the sequential batch loop

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::classify::item_type;
use crate::config::RunConfig;
use crate::error::{BatchError, ExtractError};
use crate::extractors::extract;
use crate::fetch::Fetch;
use crate::flatten::flatten;
use crate::normalize::{normalize_items, Syntax, SyntaxResultSet};

/// Property name used on rows standing in for a failed URL
pub const ERROR_PROPERTY: &str = "ERROR";

/// One leaf value of one extracted item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub url: String,
    /// Empty on error rows
    pub syntax: String,
    /// `None` on error rows
    pub item_index: Option<usize>,
    pub item_type: String,
    pub property: String,
    pub value: String,
}

impl FlatRow {
    /// Row recording that `url` could not be processed
    pub fn error(url: &str, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            syntax: String::new(),
            item_index: None,
            item_type: String::new(),
            property: ERROR_PROPERTY.to_string(),
            value: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.item_index.is_none() && self.property == ERROR_PROPERTY
    }
}

/// Compact JSON of everything found on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerUrlSummary {
    /// URL after redirects
    pub url: String,
    pub structured_data_json: String,
}

/// Result of processing one URL successfully
#[derive(Debug, Clone)]
pub struct UrlExtraction {
    pub summary: PerUrlSummary,
    pub items: SyntaxResultSet,
    pub rows: Vec<FlatRow>,
}

/// Fetch one URL, extract its structured data and flatten it.
///
/// Rows and the summary carry the final URL after redirects.
pub fn process_url<F: Fetch + ?Sized>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
) -> Result<UrlExtraction, ExtractError> {
    let page = fetcher.fetch(url, timeout)?;

    let raw = extract(&page.body, &page.final_url, &Syntax::ALL)?;
    let items = normalize_items(&raw);

    let rows = flatten_result_set(&page.final_url, &items);
    let summary = PerUrlSummary {
        url: page.final_url,
        structured_data_json: items.to_compact_json(),
    };

    Ok(UrlExtraction { summary, items, rows })
}

/// Flatten every item of every syntax into rows tagged with `url`
pub fn flatten_result_set(url: &str, items: &SyntaxResultSet) -> Vec<FlatRow> {
    let mut rows = Vec::new();

    for (syntax, syntax_items) in items.iter() {
        for (idx, item) in syntax_items.iter().enumerate() {
            let label = item_type(item);
            rows.extend(flatten(item).into_iter().map(|pv| FlatRow {
                url: url.to_string(),
                syntax: syntax.as_str().to_string(),
                item_index: Some(idx),
                item_type: label.clone(),
                property: pv.path,
                value: pv.value,
            }));
        }
    }

    rows
}

/// Split pasted input into URLs, one per non-blank line
pub fn parse_url_list(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Progress signal sent after each URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress<'a> {
    pub completed: usize,
    pub total: usize,
    pub url: &'a str,
    pub succeeded: bool,
}

/// Accumulated output of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub summaries: Vec<PerUrlSummary>,
    pub rows: Vec<FlatRow>,
    pub processed: usize,
    pub failed: usize,
}

/// Process `urls` one at a time, in order.
///
/// A failing URL contributes a single error row and the batch moves on. The
/// configured delay is slept after every URL, then `on_progress` is called.
pub fn run_batch<F, P>(
    fetcher: &F,
    urls: &[String],
    config: &RunConfig,
    mut on_progress: P,
) -> Result<BatchReport, BatchError>
where
    F: Fetch + ?Sized,
    P: FnMut(BatchProgress<'_>),
{
    if urls.is_empty() {
        return Err(BatchError::NoUrls);
    }

    let total = urls.len();
    let mut report = BatchReport::default();
    info!(total, timeout_secs = config.timeout.as_secs(), "starting extraction");

    for (i, url) in urls.iter().enumerate() {
        debug!(url = %url, position = i + 1, total, "processing");

        let succeeded = match process_url(fetcher, url, config.timeout) {
            Ok(extraction) => {
                debug!(
                    url = %extraction.summary.url,
                    items = extraction.items.item_count(),
                    rows = extraction.rows.len(),
                    "extracted"
                );
                report.summaries.push(extraction.summary);
                report.rows.extend(extraction.rows);
                true
            }
            Err(e) => {
                warn!(url = %url, error = %e, "extraction failed");
                report.rows.push(FlatRow::error(url, e.to_string()));
                report.failed += 1;
                false
            }
        };
        report.processed += 1;

        if !config.delay.is_zero() {
            thread::sleep(config.delay);
        }

        on_progress(BatchProgress {
            completed: i + 1,
            total,
            url,
            succeeded,
        });
    }

    info!(
        processed = report.processed,
        failed = report.failed,
        rows = report.rows.len(),
        "extraction finished"
    );
    Ok(report)
}
