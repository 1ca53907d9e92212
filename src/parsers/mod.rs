pub mod html;

pub use html::{Document, parse_selector};
