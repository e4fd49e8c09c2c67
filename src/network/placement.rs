//! Placement policies for entry nodes and high-value nodes.
//!
//! A policy is either disabled (the nodes flagged in the network input are
//! used as-is) or enabled, in which case exactly one selection method must be
//! switched on. Each variant declares its method flags as an explicit ordered
//! list; `random` is shared by both variants and always comes first.

use std::fmt;

use crate::config::{
    BoolItem, ConfigGroup, Element, ElementMut, IntItem, ItemProperties, ValidationResult,
};
use crate::error::ConfigError;

/// Which node subset a policy places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementTarget {
    Entry,
    HighValue,
}

/// A selection method a policy can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMethod {
    /// Uniformly random choice.
    Random,
    /// Prefer nodes on the edge of the network (entry only).
    CloseToEdge,
    /// Prefer central nodes (entry only).
    CloseToCenter,
    /// Prefer nodes far from every entry node (high value only).
    FarFromEntry,
}

impl PlacementMethod {
    /// Field name of the flag backing this method.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::CloseToEdge => "place_close_to_edge",
            Self::CloseToCenter => "place_close_to_center",
            Self::FarFromEntry => "place_far_from_entry",
        }
    }
}

impl fmt::Display for PlacementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Fields shared by every placement policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementBase {
    pub enabled: BoolItem,
    pub count: IntItem,
    pub random: BoolItem,
}

impl PlacementBase {
    fn new(enabled: bool, count: Option<i64>, random: bool) -> Self {
        Self {
            enabled: BoolItem::new(
                Some(enabled),
                "Whether to place the node type randomly",
                ItemProperties::nullable(false).with_default(false),
            ),
            count: IntItem::new(
                count,
                "The number of nodes to place within the network",
                ItemProperties::nullable(true).with_min(0, true).with_default(0),
            ),
            random: BoolItem::new(
                Some(random),
                "Choose nodes completely randomly",
                ItemProperties::nullable(true).with_default(false),
            ),
        }
    }
}

/// Variant-specific method flags.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementKind {
    Entry {
        place_close_to_edge: BoolItem,
        place_close_to_center: BoolItem,
    },
    HighValue {
        place_far_from_entry: BoolItem,
    },
}

/// Placement policy for a node subset.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPolicy {
    doc: Option<String>,
    base: PlacementBase,
    kind: PlacementKind,
    validation: ValidationResult,
}

fn method_flag(value: bool, doc: &str, alias: &str) -> BoolItem {
    BoolItem::new(
        Some(value),
        doc,
        ItemProperties::nullable(true).with_default(false),
    )
    .with_alias(alias)
}

impl PlacementPolicy {
    /// Entry node policy.
    pub fn entry(
        enabled: bool,
        count: Option<i64>,
        random: bool,
        place_close_to_edge: bool,
        place_close_to_center: bool,
    ) -> Self {
        let kind = PlacementKind::Entry {
            place_close_to_edge: method_flag(
                place_close_to_edge,
                "Choose nodes closer to the edge of the network.",
                "prefer_edge_nodes_for_entry_nodes",
            ),
            place_close_to_center: method_flag(
                place_close_to_center,
                "Choose nodes closer to the center of the network.",
                "prefer_central_nodes_for_entry_nodes",
            ),
        };
        Self::build(
            "The pseudo random placement of the entry nodes in the network.",
            PlacementBase::new(enabled, count, random),
            kind,
        )
    }

    /// High-value node policy.
    pub fn high_value(
        enabled: bool,
        count: Option<i64>,
        random: bool,
        place_far_from_entry: bool,
    ) -> Self {
        let kind = PlacementKind::HighValue {
            place_far_from_entry: method_flag(
                place_far_from_entry,
                "Choose nodes far away from entry nodes.",
                "choose_high_value_nodes_furthest_away_from_entry",
            ),
        };
        Self::build(
            "The pseudo random placement of the high value nodes in the network.",
            PlacementBase::new(enabled, count, random),
            kind,
        )
    }

    /// A disabled policy of the given target.
    pub fn disabled(target: PlacementTarget) -> Self {
        match target {
            PlacementTarget::Entry => Self::entry(false, None, false, false, false),
            PlacementTarget::HighValue => Self::high_value(false, None, false, false),
        }
    }

    fn build(doc: &str, base: PlacementBase, kind: PlacementKind) -> Self {
        let mut policy = Self {
            doc: Some(doc.to_string()),
            base,
            kind,
            validation: ValidationResult::default(),
        };
        policy.validate();
        policy
    }

    pub fn target(&self) -> PlacementTarget {
        match self.kind {
            PlacementKind::Entry { .. } => PlacementTarget::Entry,
            PlacementKind::HighValue { .. } => PlacementTarget::HighValue,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.base.enabled.value().unwrap_or(false)
    }

    pub fn count(&self) -> Option<i64> {
        self.base.count.value()
    }

    pub fn base(&self) -> &PlacementBase {
        &self.base
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.base.enabled.set_value(Some(enabled));
    }

    pub fn set_count(&mut self, count: Option<i64>) {
        self.base.count.set_value(count);
    }

    /// Override the external names of `count` and `random`.
    pub fn set_aliases(&mut self, count_alias: &str, random_alias: &str) {
        self.base.count.set_alias(count_alias);
        self.base.random.set_alias(random_alias);
    }

    /// Method flags in evaluation order.
    pub fn method_flags(&self) -> Vec<(PlacementMethod, &BoolItem)> {
        let mut flags = vec![(PlacementMethod::Random, &self.base.random)];
        match &self.kind {
            PlacementKind::Entry {
                place_close_to_edge,
                place_close_to_center,
            } => {
                flags.push((PlacementMethod::CloseToEdge, place_close_to_edge));
                flags.push((PlacementMethod::CloseToCenter, place_close_to_center));
            }
            PlacementKind::HighValue { place_far_from_entry } => {
                flags.push((PlacementMethod::FarFromEntry, place_far_from_entry));
            }
        }
        flags
    }

    fn method_flag_mut(&mut self, method: PlacementMethod) -> Option<&mut BoolItem> {
        match (method, &mut self.kind) {
            (PlacementMethod::Random, _) => Some(&mut self.base.random),
            (PlacementMethod::CloseToEdge, PlacementKind::Entry { place_close_to_edge, .. }) => {
                Some(place_close_to_edge)
            }
            (PlacementMethod::CloseToCenter, PlacementKind::Entry { place_close_to_center, .. }) => {
                Some(place_close_to_center)
            }
            (PlacementMethod::FarFromEntry, PlacementKind::HighValue { place_far_from_entry }) => {
                Some(place_far_from_entry)
            }
            _ => None,
        }
    }

    /// Switch a method flag on or off. Methods foreign to this variant are
    /// rejected.
    pub fn set_method(&mut self, method: PlacementMethod, enabled: bool) -> Result<(), ConfigError> {
        let name = self.name();
        let flag = self.method_flag_mut(method).ok_or_else(|| ConfigError::UnknownKey {
            group: name.to_string(),
            key: method.field_name().to_string(),
        })?;
        flag.set_value(Some(enabled));
        Ok(())
    }

    /// Methods whose flag resolves to true.
    pub fn enabled_methods(&self) -> Vec<PlacementMethod> {
        self.method_flags()
            .into_iter()
            .filter(|(_, flag)| flag.value().unwrap_or(false))
            .map(|(method, _)| method)
            .collect()
    }

    /// The single method in effect, if the policy is enabled and unambiguous.
    pub fn selected_method(&self) -> Option<PlacementMethod> {
        if !self.is_enabled() {
            return None;
        }
        match self.enabled_methods().as_slice() {
            [method] => Some(*method),
            _ => None,
        }
    }
}

impl ConfigGroup for PlacementPolicy {
    fn name(&self) -> &'static str {
        match self.kind {
            PlacementKind::Entry { .. } => "entry_node_random_placement",
            PlacementKind::HighValue { .. } => "high_value_node_random_placement",
        }
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn elements(&self) -> Vec<(&'static str, Element<'_>)> {
        let mut elements: Vec<(&'static str, Element<'_>)> = vec![
            ("use", Element::Item(&self.base.enabled)),
            ("count", Element::Item(&self.base.count)),
            ("random", Element::Item(&self.base.random)),
        ];
        match &self.kind {
            PlacementKind::Entry {
                place_close_to_edge,
                place_close_to_center,
            } => {
                elements.push(("place_close_to_edge", Element::Item(place_close_to_edge)));
                elements.push(("place_close_to_center", Element::Item(place_close_to_center)));
            }
            PlacementKind::HighValue { place_far_from_entry } => {
                elements.push(("place_far_from_entry", Element::Item(place_far_from_entry)));
            }
        }
        elements
    }

    fn elements_mut(&mut self) -> Vec<(&'static str, ElementMut<'_>)> {
        let mut elements: Vec<(&'static str, ElementMut<'_>)> = vec![
            ("use", ElementMut::Item(&mut self.base.enabled)),
            ("count", ElementMut::Item(&mut self.base.count)),
            ("random", ElementMut::Item(&mut self.base.random)),
        ];
        match &mut self.kind {
            PlacementKind::Entry {
                place_close_to_edge,
                place_close_to_center,
            } => {
                elements.push(("place_close_to_edge", ElementMut::Item(place_close_to_edge)));
                elements.push(("place_close_to_center", ElementMut::Item(place_close_to_center)));
            }
            PlacementKind::HighValue { place_far_from_entry } => {
                elements.push(("place_far_from_entry", ElementMut::Item(place_far_from_entry)));
            }
        }
        elements
    }

    fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    fn validation_mut(&mut self) -> &mut ValidationResult {
        &mut self.validation
    }

    fn check_rules(&self, result: &mut ValidationResult) {
        if !self.is_enabled() {
            return;
        }
        let n = self.enabled_methods().len();
        if n == 0 {
            result.add_group_error(
                "If the user does not set the placement of nodes then a method of setting them randomly must be chosen",
            );
        } else if n > 1 {
            result.add_group_error(format!(
                "{} methods of choosing node placement have been selected but only 1 can be used",
                n
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepresentationOptions;
    use serde_json::json;

    #[test]
    fn test_disabled_policy_skips_method_rule() {
        let policy = PlacementPolicy::entry(false, None, true, true, true);
        assert!(policy.validation().passed());
        assert_eq!(policy.selected_method(), None);
    }

    #[test]
    fn test_exactly_one_method_passes() {
        let entry_methods = [
            (true, false, false, PlacementMethod::Random),
            (false, true, false, PlacementMethod::CloseToEdge),
            (false, false, true, PlacementMethod::CloseToCenter),
        ];
        for (random, edge, center, expected) in entry_methods {
            let policy = PlacementPolicy::entry(true, Some(2), random, edge, center);
            assert!(policy.validation().passed(), "{:?} should be valid", expected);
            assert_eq!(policy.selected_method(), Some(expected));
        }

        let policy = PlacementPolicy::high_value(true, Some(1), false, true);
        assert!(policy.validation().passed());
        assert_eq!(policy.selected_method(), Some(PlacementMethod::FarFromEntry));
    }

    #[test]
    fn test_no_method_is_under_specified() {
        let policy = PlacementPolicy::entry(true, Some(2), false, false, false);
        assert!(!policy.validation().passed());
        let messages = policy.validation().messages_for("");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("a method of setting them randomly must be chosen"));

        let policy = PlacementPolicy::high_value(true, Some(1), false, false);
        assert!(!policy.validation().passed());
        assert_eq!(policy.selected_method(), None);
        let messages = policy.validation().messages_for("");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("a method of setting them randomly must be chosen"));
    }

    #[test]
    fn test_several_methods_are_ambiguous() {
        for (random, edge, center, n) in [
            (true, true, false, 2),
            (true, false, true, 2),
            (false, true, true, 2),
            (true, true, true, 3),
        ] {
            let policy = PlacementPolicy::entry(true, None, random, edge, center);
            let messages = policy.validation().messages_for("");
            assert_eq!(
                messages,
                vec![format!(
                    "{} methods of choosing node placement have been selected but only 1 can be used",
                    n
                )]
            );
        }

        let policy = PlacementPolicy::high_value(true, None, true, true);
        assert!(!policy.validation().passed());
    }

    #[test]
    fn test_rule_reevaluated_after_mutation() {
        let mut policy = PlacementPolicy::high_value(true, Some(1), true, false);
        assert!(policy.validation().passed());

        policy.set_method(PlacementMethod::FarFromEntry, true).unwrap();
        assert!(!policy.validate().passed());

        policy.set_method(PlacementMethod::Random, false).unwrap();
        assert!(policy.validate().passed());

        policy.set_enabled(false);
        policy.set_method(PlacementMethod::Random, true).unwrap();
        assert!(policy.validate().passed());
    }

    #[test]
    fn test_foreign_method_rejected() {
        let mut policy = PlacementPolicy::disabled(PlacementTarget::HighValue);
        let err = policy.set_method(PlacementMethod::CloseToEdge, true).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { ref key, .. } if key == "place_close_to_edge"));
    }

    #[test]
    fn test_negative_count_fails_item_check() {
        let policy = PlacementPolicy::entry(true, Some(-1), true, false, false);
        assert!(!policy.validation().passed());
        assert_eq!(policy.validation().messages_for("count"), vec!["Value -1 must be >= 0"]);
    }

    #[test]
    fn test_representation_and_reload() {
        let mut policy = PlacementPolicy::entry(true, Some(3), false, true, false);
        policy.set_aliases("number_of_entry_nodes", "choose_entry_nodes_randomly");

        let map = policy.to_representation(RepresentationOptions::values_only());
        assert_eq!(
            serde_json::Value::Object(map.clone()),
            json!({
                "use": true,
                "number_of_entry_nodes": 3,
                "choose_entry_nodes_randomly": false,
                "prefer_edge_nodes_for_entry_nodes": true,
                "prefer_central_nodes_for_entry_nodes": false,
            })
        );

        let mut reloaded = PlacementPolicy::disabled(PlacementTarget::Entry);
        reloaded.set_aliases("number_of_entry_nodes", "choose_entry_nodes_randomly");
        reloaded.load(&map).unwrap();
        assert_eq!(reloaded.count(), Some(3));
        assert_eq!(reloaded.selected_method(), Some(PlacementMethod::CloseToEdge));
    }
}
