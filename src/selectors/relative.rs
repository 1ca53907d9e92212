//! Paths from a root element down to one of its descendants.
//!
//! A relative path is re-queried under *other* instances of the root's shape,
//! possibly on freshly fetched pages, so it is built from tag names and the
//! first semantic class at each hop instead of pointing at a specific node.

use crate::extract::field::FieldType;
use crate::filter::first_semantic_class;
use crate::parsers::html::{contains, parent_element};
use crate::selectors::root::nth_child_index;
use crate::utils::css_escape_ident;
use scraper::ElementRef;
use scraper::node::Node;

/// Path token meaning "the root element itself"
pub const SELF_PATH: &str = "self";

/// Tags whose text never belongs to visible content
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

/// One hop of an element path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub tag: String,
    pub class_name: Option<String>,
}

impl PathSegment {
    fn from_element(element: &ElementRef<'_>) -> Self {
        Self {
            tag: element.value().name().to_string(),
            class_name: element
                .value()
                .attr("class")
                .filter(|c| !c.trim().is_empty())
                .map(str::to_string),
        }
    }

    fn first_semantic_class(&self) -> Option<&str> {
        self.class_name.as_deref().and_then(first_semantic_class)
    }

    /// `tag.firstSemanticClass`, or the bare tag
    fn render_relative(&self) -> String {
        match self.first_semantic_class() {
            Some(class) => format!("{}.{}", self.tag, css_escape_ident(class)),
            None => self.tag.clone(),
        }
    }

    /// `.firstSemanticClass`, or the bare tag
    fn render_absolute(&self) -> String {
        match self.first_semantic_class() {
            Some(class) => format!(".{}", css_escape_ident(class)),
            None => self.tag.clone(),
        }
    }
}

/// Generate a path from `root` to `target`, e.g. `div.info > h2.title > a`.
///
/// Returns [`SELF_PATH`] when target is the root, and falls back to
/// [`get_absolute_path`] when there is no root or target lies outside it.
pub fn generate_relative_path(root: Option<&ElementRef<'_>>, target: &ElementRef<'_>) -> String {
    let Some(root) = root else {
        return get_absolute_path(target);
    };

    if !contains(root, target) {
        ::log::debug!("Target is outside the root element, using absolute path");
        return get_absolute_path(target);
    }

    let mut segments = Vec::new();
    let mut current = Some(*target);
    while let Some(element) = current {
        if element.id() == root.id() {
            break;
        }
        segments.push(PathSegment::from_element(&element));
        current = parent_element(&element);
    }

    // Ran off the top of the tree without meeting the root
    if current.is_none() {
        return get_absolute_path(target);
    }

    if segments.is_empty() {
        return SELF_PATH.to_string();
    }

    segments
        .iter()
        .rev()
        .map(PathSegment::render_relative)
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Absolute path from below `<body>` down to `element`
pub fn get_absolute_path(element: &ElementRef<'_>) -> String {
    let path = get_element_path(element);
    if path.is_empty() {
        return element.value().name().to_string();
    }

    path.iter()
        .map(PathSegment::render_absolute)
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Segments from just below `<body>` to `element`, in root-to-leaf order
pub fn get_element_path(element: &ElementRef<'_>) -> Vec<PathSegment> {
    let mut path = Vec::new();
    let mut current = Some(*element);

    while let Some(el) = current {
        if el.value().name() == "body" {
            break;
        }
        path.push(PathSegment::from_element(&el));
        current = parent_element(&el);
    }

    path.reverse();
    path
}

/// Structural path `tag:nth-child(i) > ...` from `root` down to `target`.
///
/// Useful when the markup carries no semantic classes at all. Returns `None`
/// when target is not inside root.
pub fn structural_path(root: &ElementRef<'_>, target: &ElementRef<'_>) -> Option<String> {
    if !contains(root, target) {
        return None;
    }
    if root.id() == target.id() {
        return Some(SELF_PATH.to_string());
    }

    let mut parts = Vec::new();
    let mut current = *target;
    while current.id() != root.id() {
        let index = nth_child_index(&current)?;
        parts.push(format!("{}:nth-child({})", current.value().name(), index));
        current = parent_element(&current)?;
    }

    parts.reverse();
    Some(parts.join(" > "))
}

/// Paths (`tag:nth-of-type(i) > ...`) of every element under `root` whose own
/// text equals `target_text`, ignoring case and whitespace differences
pub fn find_text_paths(root: &ElementRef<'_>, target_text: &str) -> Vec<String> {
    let wanted = normalize_text(target_text).to_lowercase();
    let mut paths = Vec::new();
    collect_text_paths(root, "", &wanted, &mut paths);
    paths
}

fn collect_text_paths(element: &ElementRef<'_>, parent_path: &str, wanted: &str, paths: &mut Vec<String>) {
    if SKIPPED_TAGS.contains(&element.value().name()) {
        return;
    }

    let path = nth_of_type_segment(element, parent_path);

    let own_text_matches = element.children().any(|node| match node.value() {
        Node::Text(text) => normalize_text(text).to_lowercase() == wanted,
        _ => false,
    });
    if own_text_matches {
        paths.push(path.clone());
    }

    for child in element.children().filter_map(ElementRef::wrap) {
        collect_text_paths(&child, &path, wanted, paths);
    }
}

fn nth_of_type_segment(element: &ElementRef<'_>, parent_path: &str) -> String {
    let tag = element.value().name();
    let index = 1 + element
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|sibling| sibling.value().name() == tag)
        .count();

    let segment = format!("{tag}:nth-of-type({index})");
    if parent_path.is_empty() {
        segment
    } else {
        format!("{parent_path} > {segment}")
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Guess what kind of field the user meant by picking `element`
pub fn detect_element_type(element: &ElementRef<'_>) -> FieldType {
    let value = element.value();
    let tag = value.name();

    if tag == "img" {
        return FieldType::Image;
    }

    let inside_link = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "a");
    if tag == "a" || inside_link {
        return FieldType::Link;
    }

    if value.attr("href").is_some_and(|href| !href.is_empty()) {
        return FieldType::Link;
    }

    if value.attr("src").is_some_and(|src| !src.is_empty()) {
        return FieldType::Image;
    }

    FieldType::Text
}
