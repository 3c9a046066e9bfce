//! Declarative match rules and the structural matching algorithm.
//!
//! A rule set is an ordered conjunction of key/value predicates. Each
//! predicate is evaluated either against the candidate device itself or,
//! when ancestor-scoped, against every device in the candidate's ancestor
//! chain, succeeding if any ancestor satisfies it. The textual form uses an
//! `@` prefix for ancestor scope, so `{"SUBSYSTEM": "tty", "@SUBSYSTEM":
//! "usb"}` reads "a tty node somewhere below a USB device".
//!
//! On a single device, a predicate key is resolved in priority order:
//! udev property, then captured sysfs attribute, then intrinsic
//! classification field (`subsystem`, `device_type`, `driver`, `sys_name`).
//! Comparison is exact string equality - no wildcards, no case folding. A
//! key that resolves to nothing is a failed predicate, not an error.

use devrig_core::{Error, Result};
use devrig_udev::{DeviceData, DeviceSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel prefix marking a rule that must hold on an ancestor rather
/// than on the candidate device itself.
pub const ANCESTOR_MARKER: char = '@';

/// Where a rule's predicate is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    /// The predicate must hold on the candidate device itself.
    Device,

    /// The predicate must hold on some device in the ancestor chain.
    Ancestor,
}

/// One declarative key/value predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    /// Evaluation scope.
    pub scope: RuleScope,

    /// Property, attribute, or intrinsic-field key.
    pub key: String,

    /// Expected value, compared by exact string equality.
    pub value: String,
}

impl MatchRule {
    /// A device-scoped rule.
    pub fn device(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            scope: RuleScope::Device,
            key: key.into(),
            value: value.into(),
        }
    }

    /// An ancestor-scoped rule.
    pub fn ancestor(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            scope: RuleScope::Ancestor,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse the textual `KEY=VALUE` form; an `@` prefix on the key marks
    /// ancestor scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the `=` separator or the key
    /// is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use devrig_resource::rules::{MatchRule, RuleScope};
    ///
    /// let rule = MatchRule::parse("@SUBSYSTEM=usb").unwrap();
    /// assert_eq!(rule.scope, RuleScope::Ancestor);
    /// assert_eq!(rule.key, "SUBSYSTEM");
    /// assert_eq!(rule.to_string(), "@SUBSYSTEM=usb");
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let (key, value) = text
            .split_once('=')
            .ok_or_else(|| Error::configuration(format!("match rule without '=': {text:?}")))?;

        let (scope, key) = match key.strip_prefix(ANCESTOR_MARKER) {
            Some(stripped) => (RuleScope::Ancestor, stripped),
            None => (RuleScope::Device, key),
        };
        if key.is_empty() {
            return Err(Error::configuration(format!(
                "match rule with empty key: {text:?}"
            )));
        }

        Ok(Self {
            scope,
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Evaluate the single-device predicate on one device record.
    ///
    /// Resolution priority: property, then captured attribute, then
    /// intrinsic classification field. Scope is ignored here; the caller
    /// decides which devices to test.
    pub fn matches_device(&self, device: &DeviceData) -> bool {
        if device.property(&self.key) == Some(self.value.as_str()) {
            return true;
        }
        if device.attribute(&self.key) == Some(self.value.as_str()) {
            return true;
        }
        device.intrinsic(&self.key) == Some(self.value.as_str())
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            RuleScope::Device => write!(f, "{}={}", self.key, self.value),
            RuleScope::Ancestor => write!(f, "{}{}={}", ANCESTOR_MARKER, self.key, self.value),
        }
    }
}

/// Immutable, ordered conjunction of match rules.
///
/// Built once at resource construction time via [`MatchRulesBuilder`];
/// never mutated afterwards. An empty rule set matches every device (kind
/// constructors normally add a subsystem default, so "empty" in practice
/// means "everything in the declared subsystem").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRules {
    rules: Vec<MatchRule>,
}

impl MatchRules {
    /// Start building a rule set.
    pub fn builder() -> MatchRulesBuilder {
        MatchRulesBuilder { rules: Vec::new() }
    }

    /// The rules, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &MatchRule> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The declared value for `key` at the given scope, if any.
    pub fn get(&self, scope: RuleScope, key: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.scope == scope && rule.key == key)
            .map(|rule| rule.value.as_str())
    }

    /// Reopen the set as a builder so kind defaults can be overlaid at
    /// resource construction time.
    pub(crate) fn into_builder(self) -> MatchRulesBuilder {
        MatchRulesBuilder { rules: self.rules }
    }

    /// Evaluate the structural rules against a snapshot.
    ///
    /// All rules must hold (logical AND). Device-scoped rules are tested
    /// on the snapshot itself; ancestor-scoped rules succeed if any device
    /// in the ancestor chain satisfies them. This is the structural half of
    /// matching - kind filter hooks refine the verdict afterwards.
    pub fn matches(&self, snapshot: &DeviceSnapshot) -> bool {
        self.rules.iter().all(|rule| match rule.scope {
            RuleScope::Device => rule.matches_device(snapshot),
            RuleScope::Ancestor => snapshot
                .ancestors()
                .iter()
                .any(|ancestor| rule.matches_device(ancestor)),
        })
    }
}

impl fmt::Display for MatchRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for rule in &self.rules {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{rule}")?;
            first = false;
        }
        Ok(())
    }
}

/// Builder for [`MatchRules`].
///
/// User-declared rules go in first; kind constructors then overlay their
/// type-specific rules (replacing same-key declarations, since a duplicate
/// key under conjunction could never match) and finally apply the generic
/// subsystem default only if the key is still unclaimed.
#[derive(Debug, Default)]
pub struct MatchRulesBuilder {
    rules: Vec<MatchRule>,
}

impl MatchRulesBuilder {
    /// Append a device-scoped rule.
    pub fn device(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.rule(MatchRule::device(key, value))
    }

    /// Append an ancestor-scoped rule.
    pub fn ancestor(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.rule(MatchRule::ancestor(key, value))
    }

    /// Append a pre-built rule.
    pub fn rule(mut self, rule: MatchRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set a rule, replacing any existing rule with the same scope and key
    /// in place.
    pub(crate) fn set(mut self, rule: MatchRule) -> Self {
        match self
            .rules
            .iter_mut()
            .find(|existing| existing.scope == rule.scope && existing.key == rule.key)
        {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    /// Add a device-scoped rule only if no rule for `key` exists yet at
    /// either scope... the `setdefault` used for the generic subsystem.
    pub(crate) fn default_device(mut self, key: &str, value: &str) -> Self {
        if !self.rules.iter().any(|rule| rule.key == key) {
            self.rules.push(MatchRule::device(key, value));
        }
        self
    }

    /// Finish the rule set.
    pub fn build(self) -> MatchRules {
        MatchRules { rules: self.rules }
    }
}
