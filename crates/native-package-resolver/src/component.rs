// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::error::ResolutionError;
use heck::ToSnakeCase;
use serde::{Serialize, Serializer};
use std::fmt::{self, Display};

const NAMESPACE_SEPARATOR: &str = "::";
const PACKAGE_SEPARATOR: char = ':';

/// The canonical key of a component: snake_case, with any package-scoped
/// token removed. `mixr_base`, `MixrBase`, `mixr::base` and `base` all
/// canonicalize to `base` within the `mixr` package.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ComponentKey(String);

impl ComponentKey {
    /// Canonicalizes `raw` as a key of a component owned by `package`.
    pub fn canonical(package: &str, raw: &str) -> Result<Self, ResolutionError> {
        let invalid = || ResolutionError::InvalidComponentKey(raw.to_string());

        let trimmed = raw.trim();
        let package = package.to_snake_case();
        let local = match trimmed.rsplit_once(NAMESPACE_SEPARATOR) {
            Some((scope, local)) if scope.to_snake_case() == package => local,
            Some(_) => return Err(invalid()),
            None => trimmed,
        };
        if local.contains(PACKAGE_SEPARATOR) {
            return Err(invalid());
        }

        let snake = local.to_snake_case();
        let key = match snake.strip_prefix(&package) {
            Some(rest) if rest.len() > 1 && rest.starts_with('_') => rest[1..].to_string(),
            _ => snake,
        };
        if key.is_empty() || !key.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid());
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A component owned by another package. The resolver never looks inside
/// it: the pair is passed through to consumers unchanged.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExternalRequirement {
    pub package: String,
    pub component: String,
}

impl ExternalRequirement {
    pub fn new(package: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            component: component.into(),
        }
    }

    /// Parses `package:component` (or `package::component`).
    pub fn parse(raw: &str) -> Result<Self, ResolutionError> {
        split_package(raw)?
            .map(|(package, component)| Self::new(package, component))
            .ok_or_else(|| ResolutionError::InvalidExternalRequirement(raw.to_string()))
    }
}

impl Display for ExternalRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.package, PACKAGE_SEPARATOR, self.component)
    }
}

/// A requirement edge declared by a component.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Requirement {
    /// Another component of the same package.
    Internal(ComponentKey),
    /// A component of another package.
    External(ExternalRequirement),
}

impl Requirement {
    /// Parses a requirement declared inside `package`.
    ///
    /// A bare name is an internal requirement. A `package:component` pair is
    /// external, unless it names `package` itself, in which case it is the
    /// internal requirement on `component`.
    pub fn parse(package: &str, raw: &str) -> Result<Self, ResolutionError> {
        match split_package(raw)? {
            Some((scope, component)) if scope.to_snake_case() == package.to_snake_case() => {
                Ok(Requirement::Internal(ComponentKey::canonical(package, component)?))
            },
            Some((scope, component)) => Ok(Requirement::External(ExternalRequirement::new(
                scope, component,
            ))),
            None => Ok(Requirement::Internal(ComponentKey::canonical(package, raw)?)),
        }
    }

    pub fn internal(&self) -> Option<&ComponentKey> {
        match self {
            Requirement::Internal(key) => Some(key),
            Requirement::External(_) => None,
        }
    }

    pub fn external(&self) -> Option<&ExternalRequirement> {
        match self {
            Requirement::Internal(_) => None,
            Requirement::External(external) => Some(external),
        }
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Internal(key) => key.fmt(f),
            Requirement::External(external) => external.fmt(f),
        }
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Splits `scope:name` / `scope::name`, returning `None` for a bare name.
fn split_package(raw: &str) -> Result<Option<(&str, &str)>, ResolutionError> {
    let trimmed = raw.trim();
    let split = trimmed
        .split_once(NAMESPACE_SEPARATOR)
        .or_else(|| trimmed.split_once(PACKAGE_SEPARATOR));
    match split {
        None => Ok(None),
        Some((scope, name))
            if !scope.is_empty() && !name.is_empty() && !name.contains(PACKAGE_SEPARATOR) =>
        {
            Ok(Some((scope, name)))
        },
        Some(_) => Err(ResolutionError::InvalidExternalRequirement(raw.to_string())),
    }
}

/// A declared component: its key, its requirements in declaration order and
/// an optional override of the base name used for its artifact.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Component {
    key: ComponentKey,
    requires: Vec<Requirement>,
    base_name: Option<String>,
}

impl Component {
    pub fn new(key: ComponentKey) -> Self {
        Self {
            key,
            requires: Vec::new(),
            base_name: None,
        }
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requires.push(requirement);
        self
    }

    pub fn with_requirements(mut self, requirements: impl IntoIterator<Item = Requirement>) -> Self {
        self.requires.extend(requirements);
        self
    }

    /// Overrides the canonical base name, e.g. for libraries whose file
    /// names do not follow the package convention (`JSBSim`).
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = Some(base_name.into());
        self
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    pub fn requires(&self) -> &[Requirement] {
        &self.requires
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }
}
