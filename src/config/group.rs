//! Config groups: ordered collections of items and nested groups.
//!
//! Concrete groups list their fields explicitly through [`ConfigGroup::elements`]
//! and [`ConfigGroup::elements_mut`]; validation, serialization and loading
//! from a raw key/value map are all driven from that list.

use serde_json::{Map, Value};

use super::item::ItemView;
use super::validation::ValidationResult;
use crate::error::{json_type_name, ConfigError};

/// Options for [`ConfigGroup::to_representation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepresentationOptions {
    /// Emit each item as its resolved value instead of a description object.
    pub values_only: bool,
    /// Keep null values in the output.
    pub include_none: bool,
    /// Only JSON primitives, nested lists and objects. Implies `values_only`.
    pub json_serializable: bool,
}

impl Default for RepresentationOptions {
    fn default() -> Self {
        Self {
            values_only: false,
            include_none: true,
            json_serializable: false,
        }
    }
}

impl RepresentationOptions {
    pub fn values_only() -> Self {
        Self {
            values_only: true,
            ..Self::default()
        }
    }

    pub fn json() -> Self {
        Self {
            values_only: true,
            include_none: true,
            json_serializable: true,
        }
    }

    fn emits_values(&self) -> bool {
        self.values_only || self.json_serializable
    }
}

/// A borrowed field of a group.
pub enum Element<'a> {
    Item(&'a dyn ItemView),
    Group(&'a dyn ConfigGroup),
}

/// A mutably borrowed field of a group.
pub enum ElementMut<'a> {
    Item(&'a mut dyn ItemView),
    Group(&'a mut dyn ConfigGroup),
}

pub trait ConfigGroup {
    /// Name used in error messages.
    fn name(&self) -> &'static str;

    fn doc(&self) -> Option<&str>;

    /// Fields in declaration order.
    fn elements(&self) -> Vec<(&'static str, Element<'_>)>;

    fn elements_mut(&mut self) -> Vec<(&'static str, ElementMut<'_>)>;

    /// Last result computed by [`ConfigGroup::validate`].
    fn validation(&self) -> &ValidationResult;

    fn validation_mut(&mut self) -> &mut ValidationResult;

    /// Cross-field rules of this group. Violations are recorded in `result`.
    fn check_rules(&self, _result: &mut ValidationResult) {}

    /// Fields whose own constraints are not checked in the current state.
    fn skip_validation(&self, _field: &str) -> bool {
        false
    }

    /// Compute a fresh validation result without touching any cache.
    fn evaluate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        for (name, element) in self.elements() {
            match element {
                Element::Item(item) => {
                    if self.skip_validation(name) {
                        result.record_field(name, super::FieldValidation::pass());
                    } else {
                        result.record_field(name, item.check());
                    }
                }
                Element::Group(group) => result.merge(name, group.evaluate()),
            }
        }
        self.check_rules(&mut result);
        result
    }

    /// Re-validate this group and its children, caching the results.
    fn validate(&mut self) -> &ValidationResult {
        for (_, element) in self.elements_mut() {
            if let ElementMut::Group(group) = element {
                group.validate();
            }
        }
        let result = self.evaluate();
        *self.validation_mut() = result;
        self.validation()
    }

    /// Serialize to an ordered key/value map. Items are keyed by alias when
    /// they have one.
    fn to_representation(&self, options: RepresentationOptions) -> Map<String, Value> {
        represent_elements(self, options)
    }

    /// Assign one raw entry. Unknown keys and mistyped values are errors.
    fn assign(&mut self, key: &str, value: &Value) -> Result<(), ConfigError> {
        assign_element(self, key, value)
    }

    /// Apply a raw map produced by [`ConfigGroup::to_representation`] (or
    /// written by hand) and re-validate.
    fn load(&mut self, map: &Map<String, Value>) -> Result<(), ConfigError> {
        for (key, value) in map {
            self.assign(key, value)?;
        }
        self.validate();
        Ok(())
    }
}

/// Representation of the declared elements of `group`.
pub fn represent_elements<G: ConfigGroup + ?Sized>(
    group: &G,
    options: RepresentationOptions,
) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, element) in group.elements() {
        match element {
            Element::Item(item) => {
                let value = item.value_json();
                if value.is_null() && !options.include_none {
                    continue;
                }
                let key = item.alias().unwrap_or(name).to_string();
                if options.emits_values() {
                    map.insert(key, value);
                } else {
                    map.insert(key, item.describe(options.include_none));
                }
            }
            Element::Group(child) => {
                map.insert(name.to_string(), Value::Object(child.to_representation(options)));
            }
        }
    }
    map
}

/// Assign `value` to the element of `group` whose name or alias is `key`.
pub fn assign_element<G: ConfigGroup + ?Sized>(
    group: &mut G,
    key: &str,
    value: &Value,
) -> Result<(), ConfigError> {
    let group_name = group.name();

    for (name, element) in group.elements_mut() {
        match element {
            ElementMut::Item(item) => {
                if name != key && item.alias() != Some(key) {
                    continue;
                }
                // Described items carry their value under "value"
                let raw = match value {
                    Value::Object(described) => described.get("value").unwrap_or(&Value::Null),
                    other => other,
                };
                return item.assign_json(raw).map_err(|mismatch| ConfigError::WrongType {
                    key: key.to_string(),
                    expected: mismatch.expected,
                    found: json_type_name(raw),
                });
            }
            ElementMut::Group(child) => {
                if name != key {
                    continue;
                }
                return match value {
                    Value::Object(map) => child.load(map),
                    other => Err(ConfigError::WrongType {
                        key: key.to_string(),
                        expected: "object",
                        found: json_type_name(other),
                    }),
                };
            }
        }
    }

    Err(ConfigError::UnknownKey {
        group: group_name.to_string(),
        key: key.to_string(),
    })
}
