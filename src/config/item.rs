//! Typed config items with declared constraints.
//!
//! A [`ConfigItem`] wraps an optional scalar (`bool`, `i64` or `f64`) together
//! with its [`ItemProperties`]: whether it may be null, its default, and
//! optional inclusive/exclusive numeric bounds. Reading the item resolves the
//! explicit value first, then the default, then null.

use serde_json::{Map, Value};

use super::validation::FieldValidation;

/// Scalar types that can live in a [`ConfigItem`].
pub trait ItemKind: Copy + PartialEq + PartialOrd + std::fmt::Debug + std::fmt::Display {
    /// Name used in type-mismatch errors.
    const TYPE_NAME: &'static str;

    fn to_json(self) -> Value;

    /// Read a value of this kind from JSON. `None` on a type mismatch.
    fn from_json(value: &Value) -> Option<Self>;
}

impl ItemKind for bool {
    const TYPE_NAME: &'static str = "bool";

    fn to_json(self) -> Value {
        Value::Bool(self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl ItemKind for i64 {
    const TYPE_NAME: &'static str = "int";

    fn to_json(self) -> Value {
        Value::from(self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl ItemKind for f64 {
    const TYPE_NAME: &'static str = "float";

    fn to_json(self) -> Value {
        // Non-finite floats have no JSON form
        serde_json::Number::from_f64(self)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

/// Constraints attached to a [`ConfigItem`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemProperties<T> {
    pub allow_null: bool,
    pub default: Option<T>,
    pub min: Option<T>,
    pub max: Option<T>,
    pub inclusive_min: bool,
    pub inclusive_max: bool,
}

impl<T> Default for ItemProperties<T> {
    fn default() -> Self {
        Self {
            allow_null: true,
            default: None,
            min: None,
            max: None,
            inclusive_min: true,
            inclusive_max: true,
        }
    }
}

impl<T> ItemProperties<T> {
    pub fn nullable(allow_null: bool) -> Self {
        Self {
            allow_null,
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default: T) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_min(mut self, min: T, inclusive: bool) -> Self {
        self.min = Some(min);
        self.inclusive_min = inclusive;
        self
    }

    pub fn with_max(mut self, max: T, inclusive: bool) -> Self {
        self.max = Some(max);
        self.inclusive_max = inclusive;
        self
    }
}

/// A value of the wrong JSON type was assigned to an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeMismatch {
    pub expected: &'static str,
}

/// A constrained scalar config value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigItem<T> {
    value: Option<T>,
    doc: Option<String>,
    alias: Option<String>,
    properties: ItemProperties<T>,
}

pub type BoolItem = ConfigItem<bool>;
pub type IntItem = ConfigItem<i64>;
pub type FloatItem = ConfigItem<f64>;

impl<T: ItemKind> ConfigItem<T> {
    pub fn new(value: Option<T>, doc: &str, properties: ItemProperties<T>) -> Self {
        Self {
            value,
            doc: Some(doc.to_string()),
            alias: None,
            properties,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Resolved value: explicit value, then default, then null.
    pub fn value(&self) -> Option<T> {
        self.value.or(self.properties.default)
    }

    /// The explicitly assigned value, ignoring the default.
    pub fn raw_value(&self) -> Option<T> {
        self.value
    }

    pub fn set_value(&mut self, value: Option<T>) {
        self.value = value;
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn set_alias(&mut self, alias: &str) {
        self.alias = Some(alias.to_string());
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn properties(&self) -> &ItemProperties<T> {
        &self.properties
    }

    /// Check the resolved value against nullability and bounds.
    pub fn check(&self) -> FieldValidation {
        let Some(value) = self.value() else {
            return if self.properties.allow_null {
                FieldValidation::pass()
            } else {
                FieldValidation::fail("Value cannot be null")
            };
        };

        if let Some(min) = self.properties.min {
            let below = if self.properties.inclusive_min { value < min } else { value <= min };
            if below {
                let op = if self.properties.inclusive_min { ">=" } else { ">" };
                return FieldValidation::fail(format!("Value {} must be {} {}", value, op, min));
            }
        }

        if let Some(max) = self.properties.max {
            let above = if self.properties.inclusive_max { value > max } else { value >= max };
            if above {
                let op = if self.properties.inclusive_max { "<=" } else { "<" };
                return FieldValidation::fail(format!("Value {} must be {} {}", value, op, max));
            }
        }

        FieldValidation::pass()
    }
}

/// Type-erased view of a [`ConfigItem`] used when walking a group.
pub trait ItemView {
    fn check(&self) -> FieldValidation;
    fn alias(&self) -> Option<&str>;
    /// Resolved value as JSON.
    fn value_json(&self) -> Value;
    /// Value plus its declared constraints.
    fn describe(&self, include_none: bool) -> Value;
    fn assign_json(&mut self, value: &Value) -> Result<(), TypeMismatch>;
}

impl<T: ItemKind> ItemView for ConfigItem<T> {
    fn check(&self) -> FieldValidation {
        ConfigItem::check(self)
    }

    fn alias(&self) -> Option<&str> {
        ConfigItem::alias(self)
    }

    fn value_json(&self) -> Value {
        self.value().map(T::to_json).unwrap_or(Value::Null)
    }

    fn describe(&self, include_none: bool) -> Value {
        let opt = |v: Option<T>| v.map(T::to_json).unwrap_or(Value::Null);
        let fields = [
            ("value", self.value_json()),
            ("default", opt(self.properties.default)),
            ("allow_null", Value::Bool(self.properties.allow_null)),
            ("min", opt(self.properties.min)),
            ("max", opt(self.properties.max)),
            ("inclusive_min", Value::Bool(self.properties.inclusive_min)),
            ("inclusive_max", Value::Bool(self.properties.inclusive_max)),
            ("alias", self.alias.clone().map(Value::String).unwrap_or(Value::Null)),
            ("doc", self.doc.clone().map(Value::String).unwrap_or(Value::Null)),
        ];

        let mut map = Map::new();
        for (key, value) in fields {
            if include_none || !value.is_null() {
                map.insert(key.to_string(), value);
            }
        }
        Value::Object(map)
    }

    fn assign_json(&mut self, value: &Value) -> Result<(), TypeMismatch> {
        if value.is_null() {
            self.value = None;
            return Ok(());
        }
        match T::from_json(value) {
            Some(v) => {
                self.value = Some(v);
                Ok(())
            }
            None => Err(TypeMismatch {
                expected: T::TYPE_NAME,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn probability(value: Option<f64>) -> FloatItem {
        FloatItem::new(
            value,
            "A probability",
            ItemProperties::nullable(true)
                .with_min(0.0, true)
                .with_max(1.0, true),
        )
    }

    #[test]
    fn test_value_resolution_order() {
        let item = IntItem::new(None, "count", ItemProperties::nullable(true).with_default(0));
        assert_eq!(item.value(), Some(0));
        assert_eq!(item.raw_value(), None);

        let item = IntItem::new(Some(4), "count", ItemProperties::nullable(true).with_default(0));
        assert_eq!(item.value(), Some(4));

        let item = BoolItem::new(None, "flag", ItemProperties::nullable(true));
        assert_eq!(item.value(), None);
    }

    #[test]
    fn test_null_handling() {
        let nullable = BoolItem::new(None, "flag", ItemProperties::nullable(true));
        assert!(nullable.check().passed);

        let required = BoolItem::new(None, "flag", ItemProperties::nullable(false));
        let outcome = required.check();
        assert!(!outcome.passed);
        assert_eq!(outcome.message.as_deref(), Some("Value cannot be null"));
    }

    #[test]
    fn test_inclusive_bounds() {
        assert!(probability(Some(0.0)).check().passed);
        assert!(probability(Some(1.0)).check().passed);
        assert!(!probability(Some(-0.1)).check().passed);
        assert!(!probability(Some(1.5)).check().passed);
    }

    #[test]
    fn test_exclusive_bounds() {
        let item = IntItem::new(
            Some(0),
            "strictly positive",
            ItemProperties::nullable(false).with_min(0, false),
        );
        let outcome = item.check();
        assert!(!outcome.passed);
        assert_eq!(outcome.message.as_deref(), Some("Value 0 must be > 0"));
    }

    #[test]
    fn test_assign_json() {
        let mut item = probability(None);
        item.assign_json(&json!(0.25)).unwrap();
        assert_eq!(item.value(), Some(0.25));

        // Integers are acceptable floats
        item.assign_json(&json!(1)).unwrap();
        assert_eq!(item.value(), Some(1.0));

        let err = item.assign_json(&json!("high")).unwrap_err();
        assert_eq!(err.expected, "float");

        item.assign_json(&Value::Null).unwrap();
        assert_eq!(item.value(), None);

        let mut count = IntItem::new(None, "count", ItemProperties::default());
        assert!(count.assign_json(&json!(2.5)).is_err());
    }

    #[test]
    fn test_describe() {
        let item = probability(Some(0.5)).with_alias("upper_bound");
        let described = item.describe(false);
        assert_eq!(described["value"], json!(0.5));
        assert_eq!(described["alias"], json!("upper_bound"));
        assert!(described.get("default").is_none());

        let described = item.describe(true);
        assert_eq!(described["default"], Value::Null);
    }
}
