//! Sequential page-by-page extraction.
//!
//! Pages are fetched strictly one at a time in increasing order, with a fixed
//! pause between requests. Each page either yields its records or a single
//! error event; a failing page never stops the run.

use crate::config::{ExtractionConfig, PaginationConfig};
use crate::crawlers::{FetchResponse, Fetcher};
use crate::error::{ExtractError, Result};
use crate::extract::engine::{extract_from_document, validate_config};
use crate::extract::field::FieldDescriptor;
use crate::parsers::html::Document;
use crate::results::{ExtractedItem, ExtractionEvent, PagePosition};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;
use url::form_urlencoded;

/// Capacity of the event channel handed to the caller
const EVENT_BUFFER: usize = 256;

/// Build the URL of page `page_number`.
///
/// The page parameter and every extra parameter replace any parameter of the
/// same name already present on the base URL; the query string is omitted
/// when empty.
pub fn build_page_url(config: &PaginationConfig, page_number: i64) -> String {
    let mut params: Vec<(String, String)> = Vec::new();
    if !config.page_param.trim().is_empty() {
        params.push((config.page_param.clone(), page_number.to_string()));
    }
    for (name, value) in &config.other_params {
        if name.is_empty() || *name == config.page_param {
            continue;
        }
        params.push((name.clone(), value.clone()));
    }

    match Url::parse(config.base_url.trim()) {
        Ok(mut url) => {
            let replaced: HashSet<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| !replaced.contains(&**k))
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();

            url.set_query(None);
            if !kept.is_empty() || !params.is_empty() {
                url.query_pairs_mut().extend_pairs(kept).extend_pairs(params);
            }
            url.to_string()
        }
        Err(_) => {
            // Relative or malformed base URLs are composed textually
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&params)
                .finish();
            let base = config.base_url.trim();
            if query.is_empty() {
                base.to_string()
            } else if base.contains('?') {
                format!("{base}&{query}")
            } else {
                format!("{base}?{query}")
            }
        }
    }
}

/// Parse the configured starting page; anything without a leading integer means 1
pub fn get_start_page(page_param_value: &str) -> i64 {
    let trimmed = page_param_value.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(1)
}

/// Page numbers visited by a run, in order
pub fn page_numbers(config: &PaginationConfig) -> impl Iterator<Item = i64> {
    let start = get_start_page(&config.page_param_value);
    let count = config.max_pages.max(0);
    (0..count).map(move |offset| start.saturating_add(offset))
}

/// Validated inputs of a run, owned by the producer task
#[derive(Debug, Clone)]
struct RunPlan {
    root_selector: String,
    fields: Vec<FieldDescriptor>,
    pagination: PaginationConfig,
    delay: Duration,
}

impl RunPlan {
    fn from_config(config: &ExtractionConfig) -> Result<Self> {
        validate_config(
            config.root_selector.as_deref(),
            &config.fields,
            config.pagination.as_ref(),
        )
        .into_result()?;

        match (&config.root_selector, &config.pagination) {
            (Some(root_selector), Some(pagination)) => Ok(Self {
                root_selector: root_selector.clone(),
                fields: config.fields.clone(),
                pagination: pagination.clone(),
                delay: config.delay(),
            }),
            _ => Err(ExtractError::Config(vec![
                "Incomplete configuration".to_string(),
            ])),
        }
    }
}

/// Start a paginated run and get a receiver for its events.
///
/// The configuration is validated first; a failed validation is returned
/// directly and no request is made. Events arrive in page order, and in
/// document order within a page. The run stops early when `cancel` fires or
/// the receiver is dropped.
pub async fn start(
    config: &ExtractionConfig,
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationToken,
) -> Result<mpsc::Receiver<ExtractionEvent>> {
    let plan = RunPlan::from_config(config)?;
    let (tx, rx) = mpsc::channel::<ExtractionEvent>(EVENT_BUFFER);

    ::log::info!(
        "Starting extraction of {} pages from {}",
        plan.pagination.max_pages,
        plan.pagination.base_url
    );

    tokio::spawn(async move {
        run_pages(plan, fetcher.as_ref(), &tx, cancel).await;

        // Closed before `tx` drops so the receiver only sees the end of the
        // stream once the fetcher is released
        if let Err(e) = fetcher.close().await {
            ::log::warn!("Failed to close fetcher: {}", e);
        }
        drop(tx);
    });

    Ok(rx)
}

/// Producer loop feeding `tx` until every page is done or the run is stopped
async fn run_pages(
    plan: RunPlan,
    fetcher: &dyn Fetcher,
    tx: &mpsc::Sender<ExtractionEvent>,
    cancel: CancellationToken,
) {
    let mut total_items = 0usize;

    for (offset, page) in page_numbers(&plan.pagination).enumerate() {
        if cancel.is_cancelled() {
            ::log::info!("Extraction cancelled before page {}", page);
            return;
        }

        if offset > 0 && !plan.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    ::log::info!("Extraction cancelled before page {}", page);
                    return;
                }
                _ = tokio::time::sleep(plan.delay) => {}
            }
        }

        let url = build_page_url(&plan.pagination, page);
        ::log::info!("Fetching page {}: {}", page, url);

        let outcome = match fetcher.fetch(&url).await {
            Ok(response) => extract_page(&response, &plan.root_selector, &plan.fields),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(items) => {
                let total = items.len();
                if total == 0 {
                    ::log::warn!(
                        "No elements found on page {} with selector: {}",
                        page,
                        plan.root_selector
                    );
                }

                for (index, data) in items.into_iter().enumerate() {
                    let event = ExtractionEvent::Result {
                        position: PagePosition {
                            page,
                            element_number: index + 1,
                            total_elements_on_page: total,
                        },
                        data,
                    };
                    if !emit(tx, &cancel, event).await {
                        return;
                    }
                }

                total_items += total;
                ::log::info!("Page {}: extracted {} elements", page, total);
            }
            Err(e) => {
                ::log::error!("Error on page {}: {}", page, e);
                let event = ExtractionEvent::Error {
                    page,
                    message: e.to_string(),
                };
                if !emit(tx, &cancel, event).await {
                    return;
                }
            }
        }
    }

    ::log::info!("Extraction complete. Total elements: {}", total_items);
}

/// Send one event; `false` means the run must stop
async fn emit(
    tx: &mpsc::Sender<ExtractionEvent>,
    cancel: &CancellationToken,
    event: ExtractionEvent,
) -> bool {
    if cancel.is_cancelled() {
        ::log::info!("Extraction cancelled, dropping remaining events");
        return false;
    }

    if let Err(e) = tx.send(event).await {
        ::log::debug!("Event receiver dropped, stopping run: {}", e);
        return false;
    }

    true
}

/// Turn one fetched page into records.
///
/// The parsed document lives only inside this call so it is never held
/// across an await point.
fn extract_page(
    response: &FetchResponse,
    root_selector: &str,
    fields: &[FieldDescriptor],
) -> Result<Vec<ExtractedItem>> {
    if !response.ok() {
        return Err(ExtractError::Http {
            status: response.status,
            status_text: response.status_text.clone(),
        });
    }

    if response.body.trim().is_empty() {
        return Err(ExtractError::EmptyResponse);
    }

    let doc = Document::parse_with_url(&response.body, &response.url);
    extract_from_document(&doc, root_selector, fields)
}
