// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Artifact naming.
//!
//! An artifact name is `canonical_base(key) + suffix`. The canonical base is
//! produced by a [`NamingStrategy`] selected once per package; the suffix is
//! the only part that depends on the build options (`d` for Debug builds).

use crate::{
    component::{Component, ComponentKey},
    options::OptionModel,
};
use heck::{ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Appended to artifact names of Debug builds.
pub const DEBUG_SUFFIX: &str = "d";

/// Rewrites canonical component keys into package-scoped base names.
///
/// Implementations must be pure: equal inputs always yield equal names.
pub trait NamingStrategy: fmt::Debug + Send + Sync {
    /// The package-scoped base name of `key`, e.g. `mixr_base`.
    fn canonical_base(&self, package: &str, key: &ComponentKey) -> String;

    /// Joins a base name with a non-empty suffix.
    fn append_suffix(&self, base: &str, suffix: &str) -> String;
}

/// The built-in naming conventions.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// `mixr_interop_hla`, Debug: `mixr_interop_hla_d`
    #[default]
    SnakeCase,
    /// `MixrInteropHla`, Debug: `MixrInteropHlad`
    PascalCase,
    /// `mixr::interop_hla`, Debug: `mixr::interop_hla_d`
    Namespaced,
}

impl NamingStrategy for NamingConvention {
    fn canonical_base(&self, package: &str, key: &ComponentKey) -> String {
        match self {
            NamingConvention::SnakeCase => format!("{}_{}", package.to_snake_case(), key),
            NamingConvention::PascalCase => format!(
                "{}{}",
                package.to_upper_camel_case(),
                key.as_str().to_upper_camel_case()
            ),
            NamingConvention::Namespaced => format!("{}::{}", package.to_snake_case(), key),
        }
    }

    fn append_suffix(&self, base: &str, suffix: &str) -> String {
        match self {
            NamingConvention::SnakeCase | NamingConvention::Namespaced => {
                format!("{}_{}", base, suffix)
            },
            NamingConvention::PascalCase => format!("{}{}", base, suffix),
        }
    }
}

/// Computes artifact names for the components of one package.
#[derive(Clone, Debug)]
pub struct NamingPolicy {
    package: String,
    strategy: Arc<dyn NamingStrategy>,
}

impl NamingPolicy {
    pub fn new(package: impl Into<String>, strategy: Arc<dyn NamingStrategy>) -> Self {
        Self {
            package: package.into(),
            strategy,
        }
    }

    pub fn with_convention(package: impl Into<String>, convention: NamingConvention) -> Self {
        Self::new(package, Arc::new(convention))
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// The artifact name of a component, honoring its base-name override.
    pub fn artifact_name(&self, component: &Component, options: &OptionModel) -> String {
        let base = match component.base_name() {
            Some(base_name) => base_name.to_string(),
            None => self.strategy.canonical_base(&self.package, component.key()),
        };
        self.with_suffix(base, options)
    }

    /// The artifact name of a component key under the package convention.
    pub fn key_artifact_name(&self, key: &ComponentKey, options: &OptionModel) -> String {
        self.with_suffix(self.strategy.canonical_base(&self.package, key), options)
    }

    fn with_suffix(&self, base: String, options: &OptionModel) -> String {
        match suffix(options) {
            "" => base,
            suffix => self.strategy.append_suffix(&base, suffix),
        }
    }
}

/// The option-dependent suffix of artifact names.
pub fn suffix(options: &OptionModel) -> &'static str {
    if options.is_debug() { DEBUG_SUFFIX } else { "" }
}
