// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    component::{Component, ComponentKey, Requirement},
    error::ResolutionError,
};
use indexmap::IndexMap;
use log::debug;

/// The components declared by one package, in registration order.
///
/// A registry is an explicit value scoped to the build invocation that
/// created it. It is never mutated by resolution, so one registry can be
/// shared read-only by several configurations.
#[derive(Clone, Debug)]
pub struct ComponentRegistry {
    package: String,
    components: IndexMap<ComponentKey, Component>,
}

impl ComponentRegistry {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            components: IndexMap::new(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Registers a component. Fails if a component with the same canonical
    /// key is already registered.
    pub fn register(&mut self, component: Component) -> Result<(), ResolutionError> {
        if self.components.contains_key(component.key()) {
            return Err(ResolutionError::DuplicateComponent(component.key().clone()));
        }
        debug!(
            "Registered component {} with {} requirement(s)",
            self.display_name(component.key()),
            component.requires().len()
        );
        self.components.insert(component.key().clone(), component);
        Ok(())
    }

    /// Parses `key` and `requires` in the context of this package and
    /// registers the resulting component.
    pub fn declare<S: AsRef<str>>(
        &mut self,
        key: &str,
        requires: &[S],
    ) -> Result<&mut Self, ResolutionError> {
        let key = self.key(key)?;
        let requires = requires
            .iter()
            .map(|raw| self.requirement(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.register(Component::new(key).with_requirements(requires))?;
        Ok(self)
    }

    pub fn get(&self, key: &ComponentKey) -> Option<&Component> {
        self.components.get(key)
    }

    /// Looks up a component by a key written in any naming convention.
    pub fn lookup(&self, raw: &str) -> Option<&Component> {
        self.key(raw).ok().and_then(|key| self.components.get(&key))
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.components.contains_key(key)
    }

    /// All components, in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Canonicalizes a component key relative to this package.
    pub fn key(&self, raw: &str) -> Result<ComponentKey, ResolutionError> {
        ComponentKey::canonical(&self.package, raw)
    }

    /// Parses a requirement declared inside this package.
    pub fn requirement(&self, raw: &str) -> Result<Requirement, ResolutionError> {
        Requirement::parse(&self.package, raw)
    }

    /// The display name of a component, e.g. `mixr::base`.
    pub fn display_name(&self, key: &ComponentKey) -> String {
        format!("{}::{}", self.package, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_none, assert_ok, assert_some};

    #[test]
    fn test_register_and_get() {
        let mut registry = ComponentRegistry::new("mixr");
        assert_ok!(registry.declare("base", &[] as &[&str]));
        assert_ok!(registry.declare("models", &["base", "jsbsim:jsbsim"]));

        let models = assert_some!(registry.get(&registry.key("models").unwrap()));
        assert_eq!(models.requires().len(), 2);
        assert_some!(registry.lookup("MixrModels"));
        assert_some!(registry.lookup("mixr::models"));
        assert_none!(registry.lookup("terrain"));
        assert_none!(registry.lookup("other::models"));
    }

    #[test]
    fn test_duplicate_component_is_rejected() {
        let mut registry = ComponentRegistry::new("mixr");
        registry.declare("base", &[] as &[&str]).unwrap();

        let base = registry.key("base").unwrap();
        assert_eq!(
            registry.register(Component::new(base.clone())),
            Err(ResolutionError::DuplicateComponent(base.clone()))
        );
        // Another spelling of the same key is still a duplicate
        assert_eq!(
            registry.declare("MixrBase", &[] as &[&str]).map(|_| ()),
            Err(ResolutionError::DuplicateComponent(base))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_all_preserves_registration_order() {
        let mut registry = ComponentRegistry::new("mixr");
        for key in ["terrain", "base", "simulation", "models"] {
            registry.declare(key, &[] as &[&str]).unwrap();
        }
        let keys: Vec<_> = registry.all().map(|c| c.key().as_str()).collect();
        assert_eq!(keys, vec!["terrain", "base", "simulation", "models"]);
    }

    #[test]
    fn test_display_name() {
        let registry = ComponentRegistry::new("mixr");
        let key = registry.key("mixr_interop_hla").unwrap();
        assert_eq!(registry.display_name(&key), "mixr::interop_hla");
    }
}
