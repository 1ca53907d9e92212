pub mod engine;
pub mod field;


pub use engine::{ValidationReport, extract_from_document, extract_from_html, validate_config};
pub use field::{FieldDescriptor, FieldKind, FieldType, extract_child_value, extract_element_data};
