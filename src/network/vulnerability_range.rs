//! Optional `[min, max]` restriction on randomly assigned vulnerabilities.

use crate::config::{
    BoolItem, ConfigGroup, Element, ElementMut, FloatItem, ItemProperties, ValidationResult,
};

/// Range restriction applied when vulnerabilities are set randomly.
///
/// While `restrict` is off the bounds are inert: their own constraints are not
/// checked and no cross-field rule applies.
#[derive(Debug, Clone, PartialEq)]
pub struct VulnerabilityRange {
    doc: Option<String>,
    pub restrict: BoolItem,
    pub min: FloatItem,
    pub max: FloatItem,
    validation: ValidationResult,
}

fn bound(value: Option<f64>, doc: &str) -> FloatItem {
    FloatItem::new(
        value,
        doc,
        ItemProperties::nullable(true)
            .with_min(0.0, true)
            .with_max(1.0, true),
    )
}

impl VulnerabilityRange {
    pub fn new(restrict: bool, min: Option<f64>, max: Option<f64>) -> Self {
        let mut range = Self {
            doc: Some(
                "The range of vulnerabilities for the nodes in the network used when vulnerability is set randomly."
                    .to_string(),
            ),
            restrict: BoolItem::new(
                Some(restrict),
                "Whether to restrict this attribute.",
                ItemProperties::nullable(true).with_default(false),
            ),
            min: bound(min, "The minimum value of the attribute to restrict."),
            max: bound(max, "The maximum value of the attribute to restrict."),
            validation: ValidationResult::default(),
        };
        range.validate();
        range
    }

    pub fn unrestricted() -> Self {
        Self::new(false, None, None)
    }

    pub fn is_restricted(&self) -> bool {
        self.restrict.value().unwrap_or(false)
    }

    /// Effective `(min, max)` for random scores; `[0, 1]` when unrestricted.
    pub fn bounds(&self) -> (f64, f64) {
        if !self.is_restricted() {
            return (0.0, 1.0);
        }
        (self.min.value().unwrap_or(0.0), self.max.value().unwrap_or(1.0))
    }
}

impl Default for VulnerabilityRange {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl ConfigGroup for VulnerabilityRange {
    fn name(&self) -> &'static str {
        "node_vulnerabilities"
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn elements(&self) -> Vec<(&'static str, Element<'_>)> {
        vec![
            ("restrict", Element::Item(&self.restrict)),
            ("min", Element::Item(&self.min)),
            ("max", Element::Item(&self.max)),
        ]
    }

    fn elements_mut(&mut self) -> Vec<(&'static str, ElementMut<'_>)> {
        vec![
            ("restrict", ElementMut::Item(&mut self.restrict)),
            ("min", ElementMut::Item(&mut self.min)),
            ("max", ElementMut::Item(&mut self.max)),
        ]
    }

    fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    fn validation_mut(&mut self) -> &mut ValidationResult {
        &mut self.validation
    }

    fn skip_validation(&self, field: &str) -> bool {
        !self.is_restricted() && (field == "min" || field == "max")
    }

    fn check_rules(&self, result: &mut ValidationResult) {
        if !self.is_restricted() {
            return;
        }
        match (self.min.value(), self.max.value()) {
            (Some(min), Some(max)) if min > max => {
                result.add_group_error(format!(
                    "Minimum vulnerability {} is greater than maximum vulnerability {}",
                    min, max
                ));
            }
            (Some(_), Some(_)) => {}
            _ => result.add_group_error("A restricted range needs both a minimum and a maximum"),
        }
    }
}
