//! Keyed exit-rule registry.
//!
//! A pure key → rule mapping. Lookups never fall back: a missing key is an
//! error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ExitRule, ExitRuleError, StrengthRules};
use crate::domain::SignalStrength;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleKey {
    /// The single global rule.
    Default,
    Strength(SignalStrength),
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKey::Default => f.write_str("default"),
            RuleKey::Strength(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleRegistry {
    rules: BTreeMap<RuleKey, ExitRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only a default rule.
    pub fn single(rule: ExitRule) -> Self {
        let mut registry = Self::new();
        registry.insert(RuleKey::Default, rule);
        registry
    }

    /// Insert a rule, returning the one it replaced.
    pub fn insert(&mut self, key: RuleKey, rule: ExitRule) -> Option<ExitRule> {
        self.rules.insert(key, rule)
    }

    pub fn get(&self, key: RuleKey) -> Result<&ExitRule, ExitRuleError> {
        self.rules
            .get(&key)
            .ok_or_else(|| ExitRuleError::MissingRule(key.to_string()))
    }

    pub fn contains(&self, key: RuleKey) -> bool {
        self.rules.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = RuleKey> + '_ {
        self.rules.keys().copied()
    }

    /// Assemble the per-strength table. Every strength key must be present.
    pub fn strength_rules(&self) -> Result<StrengthRules, ExitRuleError> {
        Ok(StrengthRules::new(
            self.get(RuleKey::Strength(SignalStrength::Strong))?.clone(),
            self.get(RuleKey::Strength(SignalStrength::Medium))?.clone(),
            self.get(RuleKey::Strength(SignalStrength::Weak))?.clone(),
        ))
    }
}

impl From<StrengthRules> for RuleRegistry {
    fn from(rules: StrengthRules) -> Self {
        let StrengthRules {
            strong,
            medium,
            weak,
        } = rules;
        let mut registry = Self::new();
        registry.insert(RuleKey::Strength(SignalStrength::Strong), strong);
        registry.insert(RuleKey::Strength(SignalStrength::Medium), medium);
        registry.insert(RuleKey::Strength(SignalStrength::Weak), weak);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_fails_loudly() {
        let registry = RuleRegistry::single(ExitRule::preset("pure_baseline").unwrap());
        assert!(registry.get(RuleKey::Default).is_ok());
        assert_eq!(
            registry
                .get(RuleKey::Strength(SignalStrength::Weak))
                .unwrap_err(),
            ExitRuleError::MissingRule("weak".into())
        );
    }

    #[test]
    fn strength_table_roundtrip() {
        let rules = StrengthRules::preset("XAUUSD").unwrap();
        let registry = RuleRegistry::from(rules.clone());
        assert_eq!(registry.len(), 3);
        assert!(!registry.contains(RuleKey::Default));
        assert_eq!(registry.strength_rules().unwrap(), rules);
    }

    #[test]
    fn incomplete_strength_table_is_an_error() {
        let mut registry = RuleRegistry::new();
        registry.insert(
            RuleKey::Strength(SignalStrength::Strong),
            ExitRule::preset("pure_baseline").unwrap(),
        );
        assert!(matches!(
            registry.strength_rules(),
            Err(ExitRuleError::MissingRule(_))
        ));
    }

    #[test]
    fn insert_replaces() {
        let mut registry = RuleRegistry::single(ExitRule::preset("pure_baseline").unwrap());
        let old = registry.insert(RuleKey::Default, ExitRule::preset("trail_t2_l1_sl3").unwrap());
        assert_eq!(old.map(|r| r.name().to_string()), Some("pure_baseline".into()));
        assert_eq!(registry.get(RuleKey::Default).unwrap().name(), "trail_t2_l1_sl3");
    }
}
