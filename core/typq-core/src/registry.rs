//! Value-level registry of checks and conditions (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::check::{split_condition, CheckId, CheckImplementation};
use crate::checks;
use crate::error::ConfigError;
use crate::resolve::{is_provided_input, Condition};

/// Every known check and condition, keyed by id/name.
#[derive(Clone, Default, Debug)]
pub struct CheckRegistry {
    checks: BTreeMap<CheckId, Arc<CheckImplementation>>,
    conditions: BTreeMap<String, Condition>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in checks and conditions, already validated.
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        checks::register_all(&mut registry)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn register_check(&mut self, check: CheckImplementation) -> Result<(), ConfigError> {
        if self.checks.contains_key(&check.id) {
            return Err(ConfigError::DuplicateCheck(check.id));
        }
        self.checks.insert(check.id.clone(), Arc::new(check));
        Ok(())
    }

    pub fn register_condition(&mut self, condition: Condition) -> Result<(), ConfigError> {
        if self.conditions.contains_key(&condition.name) || is_provided_input(&condition.name) {
            return Err(ConfigError::DuplicateCondition(condition.name));
        }
        self.conditions.insert(condition.name.clone(), condition);
        Ok(())
    }

    pub fn check(&self, id: &str) -> Option<&Arc<CheckImplementation>> {
        self.checks.get(id)
    }

    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.get(name)
    }

    pub fn checks(&self) -> impl Iterator<Item = &Arc<CheckImplementation>> {
        self.checks.values()
    }

    pub fn condition_names(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    fn is_known(&self, name: &str) -> bool {
        is_provided_input(name) || self.conditions.contains_key(name)
    }

    /// Validate the whole dependency graph: every name a check or condition
    /// asks for must exist, and conditions must not depend on themselves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for check in self.checks.values() {
            self.validate_check(check)?;
        }

        for condition in self.conditions.values() {
            if let Some(name) = condition.inputs.iter().find(|name| !self.is_known(name)) {
                return Err(ConfigError::UnknownInput {
                    owner: condition.name.clone(),
                    name: name.clone(),
                });
            }
        }

        let mut done = Vec::new();
        for name in self.conditions.keys() {
            let mut visiting = Vec::new();
            self.visit_condition(name, &mut visiting, &mut done)?;
        }
        Ok(())
    }

    /// Check that `check` only asks for inputs and conditions that exist.
    pub fn validate_check(&self, check: &CheckImplementation) -> Result<(), ConfigError> {
        let names = check
            .inputs
            .iter()
            .map(String::as_str)
            .chain(check.conditions.iter().map(|raw| split_condition(raw).0));
        for name in names {
            if !self.is_known(name) {
                return Err(ConfigError::UnknownInput {
                    owner: check.id.clone(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn visit_condition(
        &self,
        name: &str,
        visiting: &mut Vec<String>,
        done: &mut Vec<String>,
    ) -> Result<(), ConfigError> {
        if done.iter().any(|n| n == name) {
            return Ok(());
        }
        if let Some(pos) = visiting.iter().position(|n| n == name) {
            let mut chain = visiting[pos..].to_vec();
            chain.push(name.to_string());
            return Err(ConfigError::ConditionCycle(chain));
        }
        let Some(condition) = self.conditions.get(name) else {
            return Ok(());
        };

        visiting.push(name.to_string());
        for input in &condition.inputs {
            self.visit_condition(input, visiting, done)?;
        }
        visiting.pop();
        done.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::TargetKind;
    use crate::resolve::Value;

    fn noop(id: &str) -> CheckImplementation {
        CheckImplementation::new(id, TargetKind::Font, |_| Ok(vec![])).with_inputs(&["font"])
    }

    fn cond(name: &str, inputs: &[&str]) -> Condition {
        Condition::new(name, inputs, |_| {
            let value: Value = Arc::new(true);
            Ok(Some(value))
        })
    }

    #[test]
    fn rejects_duplicate_registrations() {
        let mut registry = CheckRegistry::new();
        registry.register_check(noop("a")).unwrap();
        assert_eq!(
            registry.register_check(noop("a")),
            Err(ConfigError::DuplicateCheck("a".into()))
        );
        registry.register_condition(cond("c", &["font"])).unwrap();
        assert_eq!(
            registry.register_condition(cond("c", &["font"])),
            Err(ConfigError::DuplicateCondition("c".into()))
        );
    }

    #[test]
    fn unknown_condition_is_reported_with_owner() {
        let mut registry = CheckRegistry::new();
        registry
            .register_check(noop("a").with_conditions(&["not ghost"]))
            .unwrap();
        assert_eq!(
            registry.validate(),
            Err(ConfigError::UnknownInput {
                owner: "a".into(),
                name: "ghost".into()
            })
        );
    }

    #[test]
    fn detects_condition_cycles() {
        let mut registry = CheckRegistry::new();
        registry.register_condition(cond("x", &["y"])).unwrap();
        registry.register_condition(cond("y", &["z"])).unwrap();
        registry.register_condition(cond("z", &["x"])).unwrap();
        assert_eq!(
            registry.validate(),
            Err(ConfigError::ConditionCycle(vec![
                "x".into(),
                "y".into(),
                "z".into(),
                "x".into()
            ]))
        );
    }

    #[test]
    fn builtin_registry_validates() {
        let registry = CheckRegistry::builtin().expect("builtin registry");
        assert!(registry
            .check("com.adobe.fonts/check/family/consistent_upm")
            .is_some());
        assert!(registry.condition("is_cff").is_some());
    }

    #[test]
    fn every_builtin_condition_has_a_consumer() {
        let registry = CheckRegistry::builtin().expect("builtin registry");
        let mut wanted: Vec<&str> = Vec::new();
        for check in registry.checks() {
            wanted.extend(check.inputs.iter().map(String::as_str));
            wanted.extend(check.conditions.iter().map(|raw| split_condition(raw).0));
        }
        for name in registry.condition_names() {
            if let Some(condition) = registry.condition(name) {
                wanted.extend(condition.inputs.iter().map(String::as_str));
            }
        }
        for name in registry.condition_names() {
            assert!(wanted.contains(&name), "condition `{name}` is never requested");
        }
    }
}
