use crate::extract::field::{FieldDescriptor, FieldKind};
use crate::filter::{clean_class_names, first_semantic_class, remove_pseudo_classes};
use crate::parsers::html::{resolve_against, text_content};
use crate::selectors::relative::{detect_element_type, generate_relative_path};
use crate::selectors::root::{generate_selector, nth_child_index};
use crate::utils::{clean_up_string, to_json_key};
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use url::Url;

/// Characters of outer HTML kept in a picked element
const OUTER_HTML_LIMIT: usize = 500;

/// Characters of text content kept in a picked element
const TEXT_CONTENT_LIMIT: usize = 200;

/// What identifies a picked element for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierType {
    ClassName,
    Id,
    TagName,
}

/// Snapshot of an element the user clicked on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedElement {
    pub tag_name: String,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub selector: String,
    /// 0-based position among the parent's element children
    pub index: usize,
    pub href: Option<String>,
    pub src: Option<String>,
    /// Outer HTML, truncated
    #[serde(rename = "outerHTML")]
    pub outer_html: String,
    /// Text content, truncated
    pub text_content: String,
}

impl PickedElement {
    /// Capture an element, resolving `href`/`src` against `base_url`
    pub fn from_element(element: &ElementRef<'_>, base_url: Option<&Url>) -> Self {
        let value = element.value();
        let non_empty = |name: &str| value.attr(name).filter(|v| !v.trim().is_empty());

        Self {
            tag_name: value.name().to_string(),
            id: non_empty("id").map(str::to_string),
            class_name: non_empty("class").map(str::to_string),
            selector: generate_selector(element),
            index: nth_child_index(element).map(|i| i - 1).unwrap_or(0),
            href: non_empty("href").map(|raw| resolve_against(base_url, raw.trim())),
            src: non_empty("src").map(|raw| resolve_against(base_url, raw.trim())),
            outer_html: truncate_chars(&element.html(), OUTER_HTML_LIMIT),
            text_content: truncate_chars(&clean_up_string(&text_content(element)), TEXT_CONTENT_LIMIT),
        }
    }

    /// Cleaned class list, id or tag name, whichever is available first
    pub fn identifier(&self) -> String {
        let cleaned = self
            .class_name
            .as_deref()
            .map(|c| clean_class_names(&remove_pseudo_classes(c)))
            .unwrap_or_default();

        if !cleaned.is_empty() {
            cleaned
        } else if let Some(id) = &self.id {
            id.clone()
        } else {
            self.tag_name.clone()
        }
    }

    pub fn identifier_type(&self) -> IdentifierType {
        let has_semantic_class = self
            .class_name
            .as_deref()
            .is_some_and(|c| first_semantic_class(c).is_some());

        if has_semantic_class {
            IdentifierType::ClassName
        } else if self.id.is_some() {
            IdentifierType::Id
        } else {
            IdentifierType::TagName
        }
    }
}

/// Build a field descriptor for an element picked inside `root`.
///
/// The name comes from the first semantic class (else id, else tag), the kind
/// from [`detect_element_type`] and the path from [`generate_relative_path`].
pub fn suggest_field(root: Option<&ElementRef<'_>>, target: &ElementRef<'_>) -> FieldDescriptor {
    let value = target.value();
    let raw_name = value
        .attr("class")
        .and_then(first_semantic_class)
        .or_else(|| value.id())
        .unwrap_or_else(|| value.name());

    let kind = FieldKind::default_for(detect_element_type(target));
    let path = generate_relative_path(root, target);

    FieldDescriptor::new(&to_json_key(raw_name), &path, kind)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::field::FieldType;
    use crate::parsers::html::Document;

    const PAGE: &str = r#"<html><body>
        <div class="product-card p-4">
            <h2 class="product-title text-lg">Alpha</h2>
            <a class="btn" href="/items/1"><span>View</span></a>
            <img id="hero" src="/img/1.png" alt="Alpha">
        </div>
    </body></html>"#;

    #[test]
    fn test_picked_element_snapshot() {
        let doc = Document::parse_with_url(PAGE, "https://shop.example/list");
        let link = doc.select_first("a.btn").unwrap().unwrap();
        let picked = PickedElement::from_element(&link, doc.base_url());

        assert_eq!(picked.tag_name, "a");
        assert_eq!(picked.class_name.as_deref(), Some("btn"));
        assert_eq!(picked.selector, "a.btn");
        assert_eq!(picked.index, 1);
        assert_eq!(picked.href.as_deref(), Some("https://shop.example/items/1"));
        assert_eq!(picked.text_content, "View");
        assert!(picked.outer_html.starts_with("<a"));
        assert_eq!(picked.identifier(), "btn");
        assert_eq!(picked.identifier_type(), IdentifierType::ClassName);
    }

    #[test]
    fn test_picked_element_truncates() {
        let long_text = "x".repeat(1000);
        let html = format!("<html><body><p>{long_text}</p></body></html>");
        let doc = Document::parse(&html);
        let p = doc.select_first("p").unwrap().unwrap();
        let picked = PickedElement::from_element(&p, None);

        assert_eq!(picked.text_content.chars().count(), 200);
        assert_eq!(picked.outer_html.chars().count(), 500);
        assert_eq!(picked.identifier_type(), IdentifierType::TagName);
    }

    #[test]
    fn test_suggest_field() {
        let doc = Document::parse(PAGE);
        let card = doc.select_first(".product-card").unwrap().unwrap();

        let title = doc.select_first("h2").unwrap().unwrap();
        let field = suggest_field(Some(&card), &title);
        assert_eq!(field.name, "product_title");
        assert_eq!(field.path, "h2.product-title");
        assert_eq!(field.kind.field_type(), FieldType::Text);

        let span = doc.select_first("a span").unwrap().unwrap();
        let field = suggest_field(Some(&card), &span);
        assert_eq!(field.name, "span");
        assert_eq!(field.path, "a.btn > span");
        assert_eq!(field.kind.field_type(), FieldType::Link);

        let img = doc.select_first("img").unwrap().unwrap();
        let field = suggest_field(Some(&card), &img);
        assert_eq!(field.name, "hero");
        assert_eq!(field.kind.field_type(), FieldType::Image);
    }
}
