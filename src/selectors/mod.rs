pub mod picked;
pub mod relative;
pub mod root;

pub use picked::{IdentifierType, PickedElement, suggest_field};
pub use relative::{
    PathSegment, SELF_PATH, detect_element_type, find_text_paths, generate_relative_path,
    get_absolute_path, get_element_path, structural_path,
};
pub use root::{
    RootElementStats, calculate_element_count, calculate_root_element_stats, generate_root_selector,
    generate_selector, get_element_depth,
};
