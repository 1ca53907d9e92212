use once_cell::sync::Lazy;
use regex::Regex;

/// Responsive and state variants such as `sm:`, `hover:` or `dark:`
const VARIANT_PATTERN: &str = r"(?i)^(sm|md|lg|xl|2xl|hover|focus|active|disabled|group|peer|dark):";

/// Prefixes of single-purpose utility classes emitted by utility-first CSS frameworks
const UTILITY_PREFIXES: &[&str] = &[
    "transition",
    "duration",
    "ease",
    "animate",
    "p-",
    "m-",
    "px-",
    "py-",
    "pt-",
    "pr-",
    "pb-",
    "pl-",
    "mx-",
    "my-",
    "mt-",
    "mr-",
    "mb-",
    "ml-",
    "text-",
    "bg-",
    "border-",
    "rounded-",
    "shadow-",
    "w-",
    "h-",
    "min-w-",
    "min-h-",
    "max-w-",
    "max-h-",
    "flex",
    "grid",
    "items-",
    "justify-",
    "content-",
    "gap-",
    "space-",
    "place-",
    "object-",
    "overflow-",
    "opacity-",
    "z-",
    "top-",
    "left-",
    "right-",
    "bottom-",
    "inset-",
    "font-",
    "leading-",
    "tracking-",
    "underline",
    "decoration-",
    "sr-only",
    "visible",
    "invisible",
    "cursor-",
    "select-",
    "pointer-events-",
    "resize-",
    "list-",
    "table-",
    "order-",
    "scale-",
    "rotate-",
    "translate-",
    "skew-",
    "origin-",
    "ring-",
    "stroke-",
    "fill-",
];

/// Theme toggles that never describe content
const THEME_CLASSES: &[&str] = &["dark", "light"];

static PSEUDO_ELEMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"::[^\s.]+").unwrap());
static PSEUDO_CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":[^\s.]+").unwrap());

static DEFAULT_FILTER: Lazy<ClassFilter> = Lazy::new(ClassFilter::default);

/// Separates semantic class names from utility-framework noise
#[derive(Debug)]
pub struct ClassFilter {
    variant_regex: Regex,
    utility_regex: Regex,
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self::new(&[]).expect("Default class patterns should be valid")
    }
}

impl ClassFilter {
    /// Create a filter from the built-in denylist plus extra utility prefixes
    pub fn new(extra_prefixes: &[&str]) -> Result<Self, regex::Error> {
        let prefixes = UTILITY_PREFIXES
            .iter()
            .chain(extra_prefixes.iter())
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            variant_regex: Regex::new(VARIANT_PATTERN)?,
            utility_regex: Regex::new(&format!("(?i)^({prefixes})"))?,
        })
    }

    /// Determine if a single class token carries semantic meaning
    pub fn is_semantic(&self, token: &str) -> bool {
        let token = token.trim();
        if token.is_empty() {
            return false;
        }

        if THEME_CLASSES.iter().any(|t| t.eq_ignore_ascii_case(token)) {
            return false;
        }

        // Opacity fractions (`from-blue-50/40`) and variant syntax
        if token.contains('/') || token.contains(':') {
            return false;
        }

        !self.variant_regex.is_match(token) && !self.utility_regex.is_match(token)
    }

    /// Semantic classes of a raw `class` attribute, deduplicated in first-seen order
    pub fn semantic_classes<'a>(&self, class_name: &'a str) -> Vec<&'a str> {
        let mut kept: Vec<&str> = Vec::new();
        for token in class_name.split_whitespace() {
            if self.is_semantic(token) && !kept.contains(&token) {
                kept.push(token);
            }
        }
        kept
    }

    /// Cleaned class string: semantic classes joined by a single space
    pub fn clean(&self, class_name: &str) -> String {
        self.semantic_classes(class_name).join(" ")
    }

    /// First semantic class of a raw `class` attribute
    pub fn first_semantic<'a>(&self, class_name: &'a str) -> Option<&'a str> {
        class_name
            .split_whitespace()
            .find(|token| self.is_semantic(token))
    }
}

/// Determine if a class token is semantic using the default denylist
pub fn is_semantic_class(token: &str) -> bool {
    DEFAULT_FILTER.is_semantic(token)
}

/// Semantic classes of a raw `class` attribute using the default denylist
pub fn semantic_classes(class_name: &str) -> Vec<&str> {
    DEFAULT_FILTER.semantic_classes(class_name)
}

/// Clean a raw `class` attribute using the default denylist
pub fn clean_class_names(class_name: &str) -> String {
    DEFAULT_FILTER.clean(class_name)
}

/// First semantic class of a raw `class` attribute using the default denylist
pub fn first_semantic_class(class_name: &str) -> Option<&str> {
    DEFAULT_FILTER.first_semantic(class_name)
}

/// Remove pseudo-classes and pseudo-elements (`btn:hover` -> `btn`, `el::before` -> `el`)
pub fn remove_pseudo_classes(selector: &str) -> String {
    let without_elements = PSEUDO_ELEMENT_RE.replace_all(selector, "");
    PSEUDO_CLASS_RE
        .replace_all(&without_elements, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utility_classes_rejected() {
        for token in [
            "p-4",
            "px-2",
            "bg-white",
            "text-lg",
            "border-gray-200",
            "rounded-lg",
            "shadow-md",
            "w-full",
            "min-h-screen",
            "flex",
            "flex-col",
            "grid-cols-3",
            "items-center",
            "justify-between",
            "opacity-50",
            "sr-only",
        ] {
            assert!(!is_semantic_class(token), "{token} should be rejected");
        }
    }

    #[test]
    fn test_variant_prefixes_rejected() {
        for token in [
            "sm:text-lg",
            "md:flex",
            "2xl:p-8",
            "hover:shadow-lg",
            "focus:ring-2",
            "active:bg-blue-600",
            "dark:bg-black",
            "group:visible",
            "peer:hidden",
        ] {
            assert!(!is_semantic_class(token), "{token} should be rejected");
        }
    }

    #[test]
    fn test_slash_and_colon_rejected() {
        assert!(!is_semantic_class("from-blue-50/40"));
        assert!(!is_semantic_class("card/wide"));
        assert!(!is_semantic_class("btn:hover"));
    }

    #[test]
    fn test_empty_and_theme_rejected() {
        assert!(!is_semantic_class(""));
        assert!(!is_semantic_class("   "));
        assert!(!is_semantic_class("dark"));
        assert!(!is_semantic_class("light"));
    }

    #[test]
    fn test_semantic_classes_kept() {
        for token in ["product", "product-card", "item-title", "price-label", "card"] {
            assert!(is_semantic_class(token), "{token} should be kept");
        }
    }

    #[test]
    fn test_clean_class_names() {
        let cleaned = clean_class_names("product-card p-4 bg-white border rounded");
        assert!(cleaned.contains("product-card"));
        assert!(!cleaned.contains("p-4"));
        assert!(!cleaned.contains("bg-white"));

        assert_eq!(clean_class_names("sm:text-lg md:text-xl lg:text-2xl"), "");
        assert_eq!(
            clean_class_names("hover:shadow-lg focus:ring-2 active:bg-blue-600"),
            ""
        );
        assert_eq!(clean_class_names(""), "");
        assert_eq!(clean_class_names("   "), "");
    }

    #[test]
    fn test_clean_deduplicates_in_order() {
        assert_eq!(clean_class_names("product product card card"), "product card");
    }

    #[test]
    fn test_first_semantic_class() {
        assert_eq!(first_semantic_class("p-4 title text-xl main"), Some("title"));
        assert_eq!(first_semantic_class("p-4 text-xl"), None);
    }

    #[test]
    fn test_extra_prefixes() {
        let filter = ClassFilter::new(&["js-"]).unwrap();
        assert!(!filter.is_semantic("js-product-miniature"));
        assert!(filter.is_semantic("product-miniature"));
        assert!(is_semantic_class("js-product-miniature"));
    }

    #[test]
    fn test_remove_pseudo_classes() {
        assert_eq!(remove_pseudo_classes("btn:hover"), "btn");
        assert_eq!(remove_pseudo_classes("link:focus"), "link");
        assert_eq!(remove_pseudo_classes("element::before"), "element");
        assert_eq!(remove_pseudo_classes("btn:hover:focus"), "btn");
        assert_eq!(remove_pseudo_classes(""), "");
    }
}
