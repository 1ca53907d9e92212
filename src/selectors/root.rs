//! Selector synthesis for the repeating "root" element of a record.
//!
//! Selectors produced here describe the *shape* of an element (tag plus its
//! semantic classes) so that they match every sibling record, not just the
//! instance the user picked.

use crate::filter::semantic_classes;
use crate::parsers::html::{element_children, parent_element, parse_selector, top_element};
use crate::utils::css_escape_ident;
use scraper::ElementRef;
use serde::Serialize;

/// Maximum number of classes kept in a synthesized selector
const MAX_SELECTOR_CLASSES: usize = 3;

/// Summary of a candidate root element, shown to the user while picking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootElementStats {
    /// Elements in the document matched by `selector`
    pub count_on_page: usize,
    pub tag_name: String,
    pub has_id: bool,
    pub has_class_name: bool,
    /// Ancestor hops to the document root
    pub depth: usize,
    /// Direct element children
    pub children_count: usize,
    pub selector: String,
}

/// Derive a CSS selector matching `element` and its same-shaped siblings.
///
/// Priority: `tag.c1.c2.c3` from the first semantic classes, then
/// `tag:nth-child(N)` when the element has a parent, then the bare tag.
pub fn generate_selector(element: &ElementRef<'_>) -> String {
    let tag = element.value().name();
    let class_attr = element.value().attr("class").unwrap_or_default();
    let classes = semantic_classes(class_attr);

    if !classes.is_empty() {
        let suffix = classes
            .iter()
            .take(MAX_SELECTOR_CLASSES)
            .map(|c| css_escape_ident(c))
            .collect::<Vec<_>>()
            .join(".");
        return format!("{tag}.{suffix}");
    }

    match nth_child_index(element) {
        Some(index) => format!("{tag}:nth-child({index})"),
        None => tag.to_string(),
    }
}

/// Derive the selector used to re-find the root element on fetched pages.
///
/// Unlike [`generate_selector`] an id wins over everything, and all semantic
/// classes are kept.
pub fn generate_root_selector(element: &ElementRef<'_>) -> String {
    if let Some(id) = element.value().id().filter(|id| !id.trim().is_empty()) {
        return format!("#{}", css_escape_ident(id));
    }

    let class_attr = element.value().attr("class").unwrap_or_default();
    let classes = semantic_classes(class_attr);
    if !classes.is_empty() {
        let joined = classes
            .iter()
            .map(|c| css_escape_ident(c))
            .collect::<Vec<_>>()
            .join(".");
        return format!(".{joined}");
    }

    let tag = element.value().name();
    match nth_child_index(element) {
        Some(index) => format!("{tag}:nth-child({index})"),
        None => tag.to_string(),
    }
}

/// Count the elements in the whole document matched by `element`'s own selector
pub fn calculate_element_count(element: &ElementRef<'_>) -> usize {
    let selector_text = generate_selector(element);
    let selector = match parse_selector(&selector_text) {
        Ok(selector) => selector,
        Err(e) => {
            ::log::warn!("Cannot count matches: {}", e);
            return 0;
        }
    };

    let top = top_element(element);
    let top_matches = usize::from(selector.matches(&top));
    top_matches + top.select(&selector).count()
}

/// Number of ancestor elements between `element` and the document root
pub fn get_element_depth(element: &ElementRef<'_>) -> usize {
    element
        .ancestors()
        .filter(|node| node.value().is_element())
        .count()
}

/// Aggregate statistics for a candidate root element
pub fn calculate_root_element_stats(element: &ElementRef<'_>) -> RootElementStats {
    let value = element.value();

    RootElementStats {
        count_on_page: calculate_element_count(element),
        tag_name: value.name().to_string(),
        has_id: value.id().is_some_and(|id| !id.is_empty()),
        has_class_name: value
            .attr("class")
            .is_some_and(|class| !class.trim().is_empty()),
        depth: get_element_depth(element),
        children_count: element_children(element).len(),
        selector: generate_selector(element),
    }
}

/// 1-based position among the parent's element children
pub(crate) fn nth_child_index(element: &ElementRef<'_>) -> Option<usize> {
    let parent = parent_element(element)?;
    element_children(&parent)
        .iter()
        .position(|child| child.id() == element.id())
        .map(|i| i + 1)
}
