use crate::error::{ExtractError, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Value of the first `<base href>`, if any
fn declared_base(html: &Html) -> Option<String> {
    let selector = parse_selector("base[href]").ok()?;
    html.select(&selector)
        .next()
        .and_then(|base| base.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// Compile a CSS selector, turning parse failures into `InvalidSelector`
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::invalid_selector(selector, e))
}

/// A parsed HTML document queried with CSS selectors.
///
/// The same type backs both a page captured from a live browser session and
/// a page fetched over HTTP, so every algorithm in the crate is document
/// agnostic. The optional base URL is used to resolve relative `href` and
/// `src` attributes the way a browser would.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses a full HTML document
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            base_url: None,
        }
    }

    /// Parses a full HTML document fetched from `url`.
    ///
    /// A `<base href>` in the document takes precedence over `url`, resolved
    /// against it when relative.
    pub fn parse_with_url(html: &str, url: &str) -> Self {
        let html = Html::parse_document(html);
        let document_url = Url::parse(url).ok();
        if document_url.is_none() {
            ::log::debug!("Document URL is not absolute, links stay relative: {}", url);
        }

        let base_url = match (declared_base(&html), document_url) {
            (Some(href), Some(doc_url)) => Some(doc_url.join(&href).unwrap_or(doc_url)),
            (Some(href), None) => Url::parse(&href).ok(),
            (None, doc_url) => doc_url,
        };

        Self { html, base_url }
    }

    /// URL the document was loaded from, if known
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// The `<html>` element
    pub fn root_element(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// The `<body>` element, if the parser produced one
    pub fn body(&self) -> Option<ElementRef<'_>> {
        let selector = parse_selector("body").ok()?;
        self.html.select(&selector).next()
    }

    /// All elements matching `selector`, in document order
    pub fn select_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    /// First element matching `selector`
    pub fn select_first(&self, selector: &str) -> Result<Option<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).next())
    }

    /// Number of elements matching `selector`
    pub fn count(&self, selector: &str) -> Result<usize> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).count())
    }

    /// Resolve a raw attribute value against the document URL
    pub fn resolve_url(&self, raw: &str) -> String {
        resolve_against(self.base_url.as_ref(), raw)
    }
}

/// Resolve `raw` against `base`, keeping the raw value when it cannot be joined
pub fn resolve_against(base: Option<&Url>, raw: &str) -> String {
    match base.and_then(|b| b.join(raw).ok()) {
        Some(resolved) => resolved.to_string(),
        None => raw.to_string(),
    }
}

/// Trimmed text content of an element
pub fn text_content(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Direct element children of an element
pub fn element_children<'a>(element: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap).collect()
}

/// Parent element, `None` for the document's root element
pub fn parent_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

/// The topmost element of the tree containing `element`
pub fn top_element<'a>(element: &ElementRef<'a>) -> ElementRef<'a> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .last()
        .unwrap_or(*element)
}

/// Whether `target` is `root` itself or lies inside it
pub fn contains(root: &ElementRef<'_>, target: &ElementRef<'_>) -> bool {
    root.id() == target.id() || target.ancestors().any(|node| node.id() == root.id())
}
