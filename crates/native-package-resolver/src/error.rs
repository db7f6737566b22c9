// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    component::ComponentKey,
    options::{OptionName, Os},
};
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Errors raised while declaring or resolving a package.
///
/// All of these are configuration errors: they are deterministic, so callers
/// should surface them rather than retry.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ResolutionError {
    #[error("Component {0} is declared more than once")]
    DuplicateComponent(ComponentKey),
    #[error("Component {component} requires {missing}, which is not declared in the package")]
    UnresolvedRequirement {
        component: ComponentKey,
        missing: ComponentKey,
    },
    #[error("Requirement rule targets undeclared component {0}")]
    UnknownComponent(ComponentKey),
    #[error(
        "Components {} and {} both produce artifact {name}",
        components[0],
        components[1]
    )]
    DuplicateArtifact {
        name: String,
        components: [ComponentKey; 2],
    },
    #[error("Cyclic dependency between components: {0}")]
    CyclicDependency(CyclePath),
    #[error("Unrecognized option: {0}")]
    InvalidOption(String),
    #[error("Invalid value {value:?} for option {name}")]
    InvalidOptionValue { name: OptionName, value: String },
    #[error("Option {name} is not applicable on {platform}")]
    OptionNotApplicable { name: OptionName, platform: Os },
    #[error("Invalid component key: {0:?}")]
    InvalidComponentKey(String),
    #[error("Invalid external requirement {0:?}, expected `package:component`")]
    InvalidExternalRequirement(String),
}

/// The components forming a dependency cycle, in edge order. The first
/// component is repeated at the end, e.g. `a -> b -> a`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CyclePath(Vec<ComponentKey>);

impl CyclePath {
    pub(crate) fn new(path: Vec<ComponentKey>) -> Self {
        Self(path)
    }

    pub fn components(&self) -> &[ComponentKey] {
        &self.0
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.0.contains(key)
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, key) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

/// Errors raised while loading a package manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Error accessing {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Error parsing package manifest: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
