use crate::parsers::html::{parse_selector, resolve_against, text_content};
use crate::selectors::relative::SELF_PATH;
use crate::utils::to_json_key;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Kind of value a field pulls out of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Link,
    Image,
}

fn enabled() -> bool {
    true
}

/// Field kind together with the sub-values it extracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default = "enabled")]
        extract_text: bool,
    },
    #[serde(rename_all = "camelCase")]
    Link {
        #[serde(default = "enabled")]
        extract_text: bool,
        #[serde(default = "enabled")]
        extract_href: bool,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        #[serde(default = "enabled")]
        extract_src: bool,
        #[serde(default)]
        extract_alt: bool,
    },
}

impl FieldKind {
    /// Default extraction flags for a field type
    pub fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => FieldKind::Text { extract_text: true },
            FieldType::Link => FieldKind::Link {
                extract_text: true,
                extract_href: true,
            },
            FieldType::Image => FieldKind::Image {
                extract_src: true,
                extract_alt: false,
            },
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text { .. } => FieldType::Text,
            FieldKind::Link { .. } => FieldType::Link,
            FieldKind::Image { .. } => FieldType::Image,
        }
    }
}

/// Declarative description of one attribute of an extracted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(default)]
    pub id: String,

    /// JSON key of the value in each record, sanitized when loaded
    #[serde(deserialize_with = "deserialize_json_key")]
    pub name: String,

    /// Relative path under the root element, or `self`
    pub path: String,

    /// Collect every match instead of the first one
    #[serde(default)]
    pub is_list: bool,

    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Create a descriptor; the name is sanitized into a JSON key
    pub fn new(name: &str, path: &str, kind: FieldKind) -> Self {
        let name = to_json_key(name);
        Self {
            id: name.clone(),
            name,
            path: path.to_string(),
            is_list: false,
            kind,
        }
    }

    /// Text field with the default flags
    pub fn text(name: &str, path: &str) -> Self {
        Self::new(name, path, FieldKind::default_for(FieldType::Text))
    }

    /// Link field extracting text and href
    pub fn link(name: &str, path: &str) -> Self {
        Self::new(name, path, FieldKind::default_for(FieldType::Link))
    }

    /// Image field extracting src
    pub fn image(name: &str, path: &str) -> Self {
        Self::new(name, path, FieldKind::default_for(FieldType::Image))
    }

    /// Mark the field as a list field
    pub fn as_list(mut self) -> Self {
        self.is_list = true;
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }
}

fn deserialize_json_key<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(to_json_key(&raw))
}

/// Where a field's value lives relative to the root element
#[derive(Debug)]
enum FieldTarget {
    Root,
    Selector(Selector),
    Invalid(String),
}

/// A field descriptor with its path compiled once per document
#[derive(Debug)]
pub struct CompiledField<'f> {
    field: &'f FieldDescriptor,
    target: FieldTarget,
}

impl<'f> CompiledField<'f> {
    pub fn compile(field: &'f FieldDescriptor) -> Self {
        let target = if field.path.trim() == SELF_PATH {
            FieldTarget::Root
        } else {
            match parse_selector(&field.path) {
                Ok(selector) => FieldTarget::Selector(selector),
                Err(e) => {
                    ::log::warn!("Field '{}' will be null: {}", field.name, e);
                    FieldTarget::Invalid(e.to_string())
                }
            }
        };

        Self { field, target }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Compilation error for this field's path, if any
    pub fn error(&self) -> Option<&str> {
        match &self.target {
            FieldTarget::Invalid(message) => Some(message),
            _ => None,
        }
    }

    /// Extract this field's value under `root`
    pub fn extract(&self, root: &ElementRef<'_>, base_url: Option<&Url>) -> Value {
        let kind = &self.field.kind;
        match &self.target {
            FieldTarget::Root => extract_element_data(root, kind, base_url),
            FieldTarget::Invalid(_) => Value::Null,
            FieldTarget::Selector(selector) if self.field.is_list => Value::Array(
                root.select(selector)
                    .map(|el| extract_element_data(&el, kind, base_url))
                    .collect(),
            ),
            FieldTarget::Selector(selector) => root
                .select(selector)
                .next()
                .map(|el| extract_element_data(&el, kind, base_url))
                .unwrap_or(Value::Null),
        }
    }
}

/// Resolve a field under `root` and extract its value.
///
/// A malformed path only nulls this field; it never fails the record.
pub fn extract_child_value(
    root: &ElementRef<'_>,
    field: &FieldDescriptor,
    base_url: Option<&Url>,
) -> Value {
    CompiledField::compile(field).extract(root, base_url)
}

/// Extract the requested sub-values of `element`.
///
/// Exactly one enabled sub-value is returned as a scalar, none yields `null`,
/// and two or more yield an object holding exactly the enabled keys.
pub fn extract_element_data(element: &ElementRef<'_>, kind: &FieldKind, base_url: Option<&Url>) -> Value {
    let mut data = Map::new();

    match *kind {
        FieldKind::Text { extract_text } => {
            if extract_text {
                data.insert("text".to_string(), text_value(element));
            }
        }
        FieldKind::Link {
            extract_text,
            extract_href,
        } => {
            if extract_text {
                data.insert("text".to_string(), text_value(element));
            }
            if extract_href {
                data.insert("href".to_string(), url_attr(element, "href", base_url));
            }
        }
        FieldKind::Image {
            extract_src,
            extract_alt,
        } => {
            if extract_src {
                data.insert("src".to_string(), url_attr(element, "src", base_url));
            }
            if extract_alt {
                data.insert("alt".to_string(), plain_attr(element, "alt"));
            }
        }
    }

    match data.len() {
        0 => Value::Null,
        1 => data.into_iter().next().map(|(_, v)| v).unwrap_or(Value::Null),
        _ => Value::Object(data),
    }
}

fn text_value(element: &ElementRef<'_>) -> Value {
    let text = text_content(element);
    if text.is_empty() {
        Value::Null
    } else {
        Value::String(text)
    }
}

fn url_attr(element: &ElementRef<'_>, name: &str, base_url: Option<&Url>) -> Value {
    match element.value().attr(name).map(str::trim) {
        Some(raw) if !raw.is_empty() => Value::String(resolve_against(base_url, raw)),
        _ => Value::Null,
    }
}

fn plain_attr(element: &ElementRef<'_>, name: &str) -> Value {
    match element.value().attr(name) {
        Some(value) if !value.is_empty() => Value::String(value.to_string()),
        _ => Value::Null,
    }
}
