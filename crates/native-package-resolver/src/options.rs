// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! The option model: the configuration axes a single build is resolved for.
//!
//! An [`OptionModel`] is constructed once per build configuration through an
//! [`OptionModelBuilder`], which validates every option eagerly. Once built,
//! the model is immutable and only supports lookups.

use crate::error::ResolutionError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    str::FromStr,
};

const BUILD_TYPE: &str = "build_type";
const SHARED: &str = "shared";
const OS: &str = "os";
const ARCH: &str = "arch";
const FPIC: &str = "fPIC";

/// The options recognized by the resolver.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum OptionName {
    BuildType,
    Shared,
    Os,
    Arch,
    Fpic,
}

impl OptionName {
    pub const ALL: [OptionName; 5] = [
        OptionName::BuildType,
        OptionName::Shared,
        OptionName::Os,
        OptionName::Arch,
        OptionName::Fpic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionName::BuildType => BUILD_TYPE,
            OptionName::Shared => SHARED,
            OptionName::Os => OS,
            OptionName::Arch => ARCH,
            OptionName::Fpic => FPIC,
        }
    }
}

impl Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionName {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            BUILD_TYPE => Ok(OptionName::BuildType),
            SHARED => Ok(OptionName::Shared),
            OS => Ok(OptionName::Os),
            ARCH => Ok(OptionName::Arch),
            FPIC | "fpic" => Ok(OptionName::Fpic),
            _ => Err(ResolutionError::InvalidOption(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum BuildType {
    Release,
    Debug,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    fn as_str(&self) -> &'static str {
        match self {
            BuildType::Release => "Release",
            BuildType::Debug => "Debug",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "release" => Ok(BuildType::Release),
            "debug" => Ok(BuildType::Debug),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            "minsizerel" => Ok(BuildType::MinSizeRel),
            _ => Err(()),
        }
    }
}

/// Target platforms, named the way native package recipes name them.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Os {
    Linux,
    Windows,
    Macos,
    #[serde(rename = "FreeBSD")]
    FreeBsd,
    Android,
    #[serde(rename = "iOS")]
    Ios,
    Emscripten,
}

impl Os {
    fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "Linux",
            Os::Windows => "Windows",
            Os::Macos => "Macos",
            Os::FreeBsd => "FreeBSD",
            Os::Android => "Android",
            Os::Ios => "iOS",
            Os::Emscripten => "Emscripten",
        }
    }
}

impl Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "linux" => Ok(Os::Linux),
            "windows" => Ok(Os::Windows),
            "macos" => Ok(Os::Macos),
            "freebsd" => Ok(Os::FreeBsd),
            "android" => Ok(Os::Android),
            "ios" => Ok(Os::Ios),
            "emscripten" => Ok(Os::Emscripten),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "armv7")]
    Armv7,
    #[serde(rename = "armv8")]
    Armv8,
    #[serde(rename = "wasm")]
    Wasm,
}

impl Arch {
    fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Armv7 => "armv7",
            Arch::Armv8 => "armv8",
            Arch::Wasm => "wasm",
        }
    }
}

impl Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "x86" => Ok(Arch::X86),
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "armv7" => Ok(Arch::Armv7),
            "armv8" | "arm64" | "aarch64" => Ok(Arch::Armv8),
            "wasm" => Ok(Arch::Wasm),
            _ => Err(()),
        }
    }
}

/// The value of a single option.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OptionValue {
    BuildType(BuildType),
    Flag(bool),
    Os(Os),
    Arch(Arch),
}

impl OptionValue {
    /// Parses `raw` as a value for the option `name`.
    pub fn parse(name: OptionName, raw: &str) -> Result<Self, ResolutionError> {
        let invalid = || ResolutionError::InvalidOptionValue {
            name,
            value: raw.to_string(),
        };
        match name {
            OptionName::BuildType => raw.parse().map(OptionValue::BuildType).map_err(|_| invalid()),
            OptionName::Os => raw.parse().map(OptionValue::Os).map_err(|_| invalid()),
            OptionName::Arch => raw.parse().map(OptionValue::Arch).map_err(|_| invalid()),
            OptionName::Shared | OptionName::Fpic => match raw.to_lowercase().trim() {
                "true" | "on" | "yes" | "1" => Ok(OptionValue::Flag(true)),
                "false" | "off" | "no" | "0" => Ok(OptionValue::Flag(false)),
                _ => Err(invalid()),
            },
        }
    }

    /// Whether this value has the right kind for the option `name`.
    fn fits(&self, name: OptionName) -> bool {
        matches!(
            (name, self),
            (OptionName::BuildType, OptionValue::BuildType(_))
                | (OptionName::Os, OptionValue::Os(_))
                | (OptionName::Arch, OptionValue::Arch(_))
                | (OptionName::Shared, OptionValue::Flag(_))
                | (OptionName::Fpic, OptionValue::Flag(_))
        )
    }
}

impl Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::BuildType(build_type) => build_type.fmt(f),
            OptionValue::Flag(flag) => flag.fmt(f),
            OptionValue::Os(os) => os.fmt(f),
            OptionValue::Arch(arch) => arch.fmt(f),
        }
    }
}

/// The validated, immutable options of one build configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OptionModel {
    values: BTreeMap<OptionName, OptionValue>,
}

impl OptionModel {
    pub fn builder() -> OptionModelBuilder {
        OptionModelBuilder::default()
    }

    /// Builds a model from raw `name=value` pairs, without defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ResolutionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = Self::builder();
        for (name, value) in pairs {
            builder = builder.set(name.as_ref(), value.as_ref())?;
        }
        builder.build()
    }

    /// Looks up an option by its textual name. Unrecognized names are an error,
    /// recognized but unset options resolve to `None`.
    pub fn resolve(&self, name: &str) -> Result<Option<&OptionValue>, ResolutionError> {
        let name = OptionName::from_str(name)?;
        Ok(self.get(name))
    }

    pub fn get(&self, name: OptionName) -> Option<&OptionValue> {
        self.values.get(&name)
    }

    pub fn build_type(&self) -> Option<BuildType> {
        match self.get(OptionName::BuildType) {
            Some(OptionValue::BuildType(build_type)) => Some(*build_type),
            _ => None,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.build_type() == Some(BuildType::Debug)
    }

    pub fn is_shared(&self) -> Option<bool> {
        self.flag(OptionName::Shared)
    }

    pub fn fpic(&self) -> Option<bool> {
        self.flag(OptionName::Fpic)
    }

    pub fn os(&self) -> Option<Os> {
        match self.get(OptionName::Os) {
            Some(OptionValue::Os(os)) => Some(*os),
            _ => None,
        }
    }

    pub fn arch(&self) -> Option<Arch> {
        match self.get(OptionName::Arch) {
            Some(OptionValue::Arch(arch)) => Some(*arch),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionName, &OptionValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    fn flag(&self, name: OptionName) -> Option<bool> {
        match self.get(name) {
            Some(OptionValue::Flag(flag)) => Some(*flag),
            _ => None,
        }
    }
}

impl Display for OptionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (name, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str("}")
    }
}

/// Collects explicit options and package defaults, then validates them in
/// [`OptionModelBuilder::build`].
#[derive(Clone, Debug, Default)]
pub struct OptionModelBuilder {
    explicit: BTreeMap<OptionName, OptionValue>,
    defaults: BTreeMap<OptionName, OptionValue>,
}

impl OptionModelBuilder {
    /// Sets an option explicitly from its textual name and value.
    pub fn set(self, name: &str, value: &str) -> Result<Self, ResolutionError> {
        let name = OptionName::from_str(name)?;
        let value = OptionValue::parse(name, value)?;
        Ok(self.set_value(name, value))
    }

    pub fn set_value(mut self, name: OptionName, value: OptionValue) -> Self {
        self.explicit.insert(name, value);
        self
    }

    /// Registers a package default, used only when the option is not set
    /// explicitly.
    pub fn default_option(self, name: &str, value: &str) -> Result<Self, ResolutionError> {
        let name = OptionName::from_str(name)?;
        let value = OptionValue::parse(name, value)?;
        Ok(self.default_value(name, value))
    }

    pub fn default_value(mut self, name: OptionName, value: OptionValue) -> Self {
        self.defaults.insert(name, value);
        self
    }

    /// Validates the collected options.
    ///
    /// `fPIC` does not exist on Windows: an explicit value is rejected with
    /// [`ResolutionError::OptionNotApplicable`], while a package default is
    /// dropped.
    pub fn build(self) -> Result<OptionModel, ResolutionError> {
        for (name, value) in self.explicit.iter().chain(self.defaults.iter()) {
            if !value.fits(*name) {
                return Err(ResolutionError::InvalidOptionValue {
                    name: *name,
                    value: value.to_string(),
                });
            }
        }

        let os = match self.explicit.get(&OptionName::Os) {
            Some(OptionValue::Os(os)) => Some(*os),
            _ => match self.defaults.get(&OptionName::Os) {
                Some(OptionValue::Os(os)) => Some(*os),
                _ => None,
            },
        };
        if os == Some(Os::Windows) && self.explicit.contains_key(&OptionName::Fpic) {
            return Err(ResolutionError::OptionNotApplicable {
                name: OptionName::Fpic,
                platform: Os::Windows,
            });
        }

        let mut values = self.explicit;
        for (name, value) in self.defaults {
            if name == OptionName::Fpic && os == Some(Os::Windows) {
                debug!("Eliding default {} on {}", name, Os::Windows);
                continue;
            }
            values.entry(name).or_insert(value);
        }

        Ok(OptionModel { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::{assert_matches, assert_none, assert_ok};

    #[test]
    fn test_resolve_recognized_options() {
        let options = assert_ok!(OptionModel::from_pairs([
            ("build_type", "Debug"),
            ("shared", "True"),
            ("os", "Linux"),
            ("fPIC", "false"),
        ]));

        assert_eq!(
            options.resolve("build_type").unwrap(),
            Some(&OptionValue::BuildType(BuildType::Debug))
        );
        assert_eq!(options.is_shared(), Some(true));
        assert_eq!(options.fpic(), Some(false));
        assert_eq!(options.os(), Some(Os::Linux));
        assert_none!(options.resolve("arch").unwrap());
        assert!(options.is_debug());
    }

    #[test]
    fn test_unrecognized_option_is_rejected() {
        assert_eq!(
            OptionModel::from_pairs([("with_hla", "true")]),
            Err(ResolutionError::InvalidOption("with_hla".to_string()))
        );
        assert_eq!(
            OptionModel::default().resolve("with_hla"),
            Err(ResolutionError::InvalidOption("with_hla".to_string()))
        );
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        assert_matches!(
            OptionModel::from_pairs([("build_type", "Fast")]),
            Err(ResolutionError::InvalidOptionValue {
                name: OptionName::BuildType,
                ..
            })
        );
        assert_matches!(
            OptionModel::from_pairs([("shared", "maybe")]),
            Err(ResolutionError::InvalidOptionValue {
                name: OptionName::Shared,
                ..
            })
        );

        // A typed value of the wrong kind is caught at build time
        let result = OptionModel::builder()
            .set_value(OptionName::Os, OptionValue::Flag(true))
            .build();
        assert_matches!(
            result,
            Err(ResolutionError::InvalidOptionValue {
                name: OptionName::Os,
                ..
            })
        );
    }

    #[test]
    fn test_explicit_fpic_on_windows_is_not_applicable() {
        assert_eq!(
            OptionModel::from_pairs([("os", "Windows"), ("fPIC", "true")]),
            Err(ResolutionError::OptionNotApplicable {
                name: OptionName::Fpic,
                platform: Os::Windows,
            })
        );
    }

    #[test]
    fn test_default_fpic_is_elided_on_windows() {
        let windows = OptionModel::builder()
            .set("os", "Windows")
            .unwrap()
            .default_option("fPIC", "true")
            .unwrap()
            .build()
            .unwrap();
        assert_none!(windows.fpic());

        let linux = OptionModel::builder()
            .set("os", "Linux")
            .unwrap()
            .default_option("fPIC", "true")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(linux.fpic(), Some(true));
    }

    #[test]
    fn test_explicit_options_override_defaults() {
        let options = OptionModel::builder()
            .default_option("shared", "false")
            .unwrap()
            .set("shared", "true")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(options.is_shared(), Some(true));
    }

    #[test]
    fn test_display_lists_options_in_order() {
        let options =
            OptionModel::from_pairs([("os", "Linux"), ("build_type", "Release")]).unwrap();
        assert_eq!(options.to_string(), "{build_type: Release, os: Linux}");
    }
}
