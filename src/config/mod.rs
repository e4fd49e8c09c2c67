//! Constrained configuration toolbox.
//!
//! Items ([`ConfigItem`]) carry a typed value plus constraints; groups
//! ([`ConfigGroup`]) aggregate items and nested groups, add cross-field rules,
//! and round-trip through a plain key/value representation.

pub mod group;
pub mod item;
pub mod metadata;
pub mod validation;

pub use group::{
    assign_element, represent_elements, ConfigGroup, Element, ElementMut, RepresentationOptions,
};
pub use item::{BoolItem, ConfigItem, FloatItem, IntItem, ItemProperties, ItemView};
pub use metadata::DocMetadata;
pub use validation::{FieldValidation, ValidationEntry, ValidationResult};
