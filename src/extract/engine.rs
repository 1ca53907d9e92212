use crate::config::PaginationConfig;
use crate::error::{ExtractError, Result};
use crate::extract::field::{CompiledField, FieldDescriptor};
use crate::parsers::html::Document;
use crate::results::ExtractedItem;
use crate::utils::to_json_key;
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of [`validate_config`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Turn a failed report into a single configuration error
    pub fn into_result(self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(ExtractError::Config(self.errors))
        }
    }
}

/// Extract one record per element matched by `root_selector`.
///
/// Records follow document order and their keys follow `fields` order. An
/// invalid root selector fails the whole call; an invalid field path only
/// nulls that field.
pub fn extract_from_document(
    doc: &Document,
    root_selector: &str,
    fields: &[FieldDescriptor],
) -> Result<Vec<ExtractedItem>> {
    let roots = doc.select_all(root_selector)?;
    let compiled: Vec<CompiledField<'_>> = fields.iter().map(CompiledField::compile).collect();
    let base_url = doc.base_url();

    ::log::debug!(
        "Root selector '{}' matched {} elements",
        root_selector,
        roots.len()
    );

    let items = roots
        .iter()
        .map(|root| {
            let mut item = ExtractedItem::new();
            for field in &compiled {
                item.insert(field.name().to_string(), field.extract(root, base_url));
            }
            item
        })
        .collect();

    Ok(items)
}

/// Parse `html` and extract records from it
pub fn extract_from_html(
    html: &str,
    page_url: Option<&str>,
    root_selector: &str,
    fields: &[FieldDescriptor],
) -> Result<Vec<ExtractedItem>> {
    let doc = match page_url {
        Some(url) => Document::parse_with_url(html, url),
        None => Document::parse(html),
    };
    extract_from_document(&doc, root_selector, fields)
}

/// Check that a run has everything it needs, reporting every problem at once
pub fn validate_config(
    root_selector: Option<&str>,
    fields: &[FieldDescriptor],
    pagination: Option<&PaginationConfig>,
) -> ValidationReport {
    let mut errors = Vec::new();

    if root_selector.is_none_or(|s| s.trim().is_empty()) {
        errors.push("Root element not selected".to_string());
    }

    if fields.is_empty() {
        errors.push("No child elements selected".to_string());
    }

    let mut seen = HashSet::new();
    for field in fields {
        if to_json_key(&field.name) != field.name {
            errors.push(format!("Invalid field name: {:?}", field.name));
        }
        if !seen.insert(field.name.as_str()) {
            errors.push(format!("Duplicate field name: {}", field.name));
        }
    }

    match pagination {
        None => errors.push("Pagination not configured".to_string()),
        Some(config) => {
            if config.base_url.trim().is_empty() {
                errors.push("Base URL is empty".to_string());
            }
            if config.page_param.trim().is_empty() {
                errors.push("Page parameter name is empty".to_string());
            }
            if config.max_pages < 1 {
                errors.push("Max pages must be at least 1".to_string());
            }
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}
