// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    component::{Component, ComponentKey, ExternalRequirement, Requirement},
    descriptor::{ExternalPackageRecord, PackageDescriptor, PackageInfo},
    error::{ManifestError, ResolutionError},
    graph::DependencyGraphBuilder,
    naming::{NamingConvention, NamingPolicy},
    options::OptionModel,
    registry::ComponentRegistry,
    rules::{Condition, RequirementRules},
};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

/***************************************************************************************************
 * Manifest Definition
 *
 **************************************************************************************************/
/// Represents the full parsed contents of a `Package.toml` manifest file.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageManifest {
    /// Metadata about the package itself, such as package name etc.
    pub package: PackageMetadata,

    /// External packages the components of this package may require.
    #[serde(default)]
    pub requires: BTreeMap<String, ExternalPackage>,

    /// Option values used when a build does not set them explicitly.
    #[serde(default, rename = "default-options")]
    pub default_options: BTreeMap<String, RawOptionValue>,

    /// Components, in declaration order.
    #[serde(default)]
    pub components: IndexMap<String, ComponentDeclaration>,

    /// Requirements that only apply under some options.
    #[serde(default)]
    pub conditional: Vec<ConditionalDeclaration>,
}

/// Metadata defined in the `[package]` section of `Package.toml`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageMetadata {
    pub name: String,

    pub version: String,

    pub license: Option<String>,

    pub url: Option<String>,

    pub description: Option<String>,

    /// Naming convention used for artifact names.
    #[serde(default)]
    pub naming: NamingConvention,

    /// The foundation component every other component implicitly requires.
    pub base: Option<String>,
}

/// An external package reference, either a bare version or a detailed table.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalPackage {
    Version(String),
    Detailed(DetailedPackage),
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DetailedPackage {
    pub version: String,
    /// Whether consumers of this package also see the headers of the
    /// external package.
    #[serde(default)]
    pub transitive_headers: bool,
}

impl ExternalPackage {
    pub fn version(&self) -> &str {
        match self {
            ExternalPackage::Version(version) => version,
            ExternalPackage::Detailed(detailed) => &detailed.version,
        }
    }

    pub fn transitive_headers(&self) -> bool {
        match self {
            ExternalPackage::Version(_) => false,
            ExternalPackage::Detailed(detailed) => detailed.transitive_headers,
        }
    }

    fn to_record(&self) -> ExternalPackageRecord {
        ExternalPackageRecord {
            version: self.version().to_string(),
            transitive_headers: self.transitive_headers(),
        }
    }
}

/// A default option value. TOML allows writing flags as booleans.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOptionValue {
    Flag(bool),
    Text(String),
}

impl RawOptionValue {
    fn as_text(&self) -> String {
        match self {
            RawOptionValue::Flag(flag) => flag.to_string(),
            RawOptionValue::Text(text) => text.clone(),
        }
    }
}

/// A `[components.<key>]` entry.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentDeclaration {
    #[serde(default)]
    pub requires: Vec<String>,

    /// Overrides the conventional base name of the artifact.
    #[serde(rename = "base-name")]
    pub base_name: Option<String>,
}

/// A `[[conditional]]` entry.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionalDeclaration {
    pub component: String,
    pub requires: String,
    pub when: Condition,
}

/***************************************************************************************************
 * Loading and Resolution
 *
 **************************************************************************************************/
impl PackageManifest {
    pub fn from_toml_str(text: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path)
            .map_err(|error| ManifestError::Io(path.to_path_buf(), error))?;
        Self::from_toml_str(&text)
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    /// Builds the component registry declared by this manifest.
    pub fn registry(&self) -> Result<ComponentRegistry, ResolutionError> {
        let mut registry = ComponentRegistry::new(&self.package.name);
        for (key, declaration) in &self.components {
            let mut component = Component::new(registry.key(key)?);
            for raw in &declaration.requires {
                let requirement = registry.requirement(raw)?;
                if let Requirement::External(external) = &requirement {
                    self.check_declared_package(key, external);
                }
                component = component.with_requirement(requirement);
            }
            if let Some(base_name) = &declaration.base_name {
                component = component.with_base_name(base_name);
            }
            registry.register(component)?;
        }
        Ok(registry)
    }

    /// Builds the requirement rules declared by this manifest.
    pub fn rules(&self) -> Result<RequirementRules, ResolutionError> {
        let package = &self.package.name;
        let mut rules = RequirementRules::new();
        if let Some(base) = &self.package.base {
            rules = rules.with_base(ComponentKey::canonical(package, base)?);
        }
        for declaration in &self.conditional {
            let external = match Requirement::parse(package, &declaration.requires)? {
                Requirement::External(external) => external,
                Requirement::Internal(_) => {
                    return Err(ResolutionError::InvalidExternalRequirement(
                        declaration.requires.clone(),
                    ));
                },
            };
            self.check_declared_package(&declaration.component, &external);
            rules = rules.with_conditional(
                ComponentKey::canonical(package, &declaration.component)?,
                declaration.when.clone(),
                external,
            );
        }
        Ok(rules)
    }

    pub fn naming_policy(&self) -> NamingPolicy {
        NamingPolicy::with_convention(&self.package.name, self.package.naming)
    }

    /// Builds the option model for one build: `explicit` options on top of
    /// the manifest's default options.
    pub fn options<K, V>(&self, explicit: &[(K, V)]) -> Result<OptionModel, ResolutionError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut builder = OptionModel::builder();
        for (name, value) in &self.default_options {
            builder = builder.default_option(name, &value.as_text())?;
        }
        for (name, value) in explicit {
            builder = builder.set(name.as_ref(), value.as_ref())?;
        }
        builder.build()
    }

    /// Resolves this manifest for one option model.
    pub fn resolve(&self, options: &OptionModel) -> Result<PackageDescriptor, ResolutionError> {
        let registry = self.registry()?;
        let rules = self.rules()?;
        let naming = self.naming_policy();
        DependencyGraphBuilder::new(&registry, &naming)
            .with_rules(&rules)
            .build(options)
    }

    /// Resolves this manifest and produces its package-info record, including
    /// the declared external packages.
    pub fn package_info(&self, options: &OptionModel) -> Result<PackageInfo, ResolutionError> {
        let external = self
            .requires
            .iter()
            .map(|(name, package)| (name.clone(), package.to_record()))
            .collect();
        Ok(self
            .resolve(options)?
            .to_package_info()
            .with_version(&self.package.version)
            .with_external(external))
    }

    fn check_declared_package(&self, component: &str, external: &ExternalRequirement) {
        if !self.requires.contains_key(&external.package) {
            warn!(
                "Component {} of {} requires {}, but package {} is not listed in [requires]",
                component, self.package.name, external, external.package
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Os;
    use claims::{assert_matches, assert_ok};
    use maplit::btreemap;
    use std::io::Write;

    const MANIFEST: &str = r#"
        [package]
        name = "mixr"
        version = "1.0.5"
        license = "LGPL-3.0"
        naming = "pascal_case"
        base = "base"

        [requires]
        openrti = "814a210978b7faafd65affbe70a2e25679921b23"
        jsbsim = { version = "1.1.11", transitive-headers = true }

        [default-options]
        fPIC = true
        shared = false

        [components.base]
        [components.simulation]
        [components.interop_hla]
        requires = ["simulation"]

        [[conditional]]
        component = "interop_hla"
        requires = "openrti:openrti"
        when = { os-not = "Windows" }
    "#;

    #[test]
    fn test_parse_manifest() {
        let manifest = PackageManifest::from_toml_str(MANIFEST).unwrap();
        assert_eq!(manifest.name(), "mixr");
        assert_eq!(manifest.package.naming, NamingConvention::PascalCase);
        assert_eq!(manifest.requires["jsbsim"].version(), "1.1.11");
        assert!(manifest.requires["jsbsim"].transitive_headers());
        assert!(!manifest.requires["openrti"].transitive_headers());
        assert_eq!(manifest.default_options, btreemap! {
            "fPIC".to_string() => RawOptionValue::Flag(true),
            "shared".to_string() => RawOptionValue::Flag(false),
        });
        let keys: Vec<_> = manifest.components.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["base", "simulation", "interop_hla"]);
        assert_eq!(manifest.conditional[0].when, Condition::OsNot(Os::Windows));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let text = MANIFEST.replace("[components.base]", "[components.base]\nlibs = [\"x\"]");
        assert_matches!(
            PackageManifest::from_toml_str(&text),
            Err(ManifestError::Toml(_))
        );
    }

    #[test]
    fn test_misspelled_package_key_is_rejected() {
        let text = MANIFEST.replace("transitive-headers = true", "transitive_headers = true");
        assert_matches!(
            PackageManifest::from_toml_str(&text),
            Err(ManifestError::Toml(_))
        );
    }

    #[test]
    fn test_resolve_manifest() {
        let manifest = PackageManifest::from_toml_str(MANIFEST).unwrap();
        let options = manifest.options(&[("build_type", "Debug"), ("os", "Linux")]).unwrap();
        assert_eq!(options.fpic(), Some(true));

        let info = assert_ok!(manifest.package_info(&options));
        assert_eq!(info.version.as_deref(), Some("1.0.5"));
        let hla = &info.components["interop_hla"];
        assert_eq!(hla.artifact_name, "MixrInteropHlad");
        assert_eq!(hla.requires, vec!["simulation", "base", "openrti:openrti"]);
        assert_eq!(hla.display_name, "mixr::interop_hla");

        assert_eq!(info.external, btreemap! {
            "jsbsim".to_string() => ExternalPackageRecord {
                version: "1.1.11".to_string(),
                transitive_headers: true,
            },
            "openrti".to_string() => ExternalPackageRecord {
                version: "814a210978b7faafd65affbe70a2e25679921b23".to_string(),
                transitive_headers: false,
            },
        });
    }

    #[test]
    fn test_windows_defaults_and_explicit_fpic() {
        let manifest = PackageManifest::from_toml_str(MANIFEST).unwrap();

        let options = manifest.options(&[("os", "Windows")]).unwrap();
        assert_eq!(options.fpic(), None);
        let descriptor = manifest.resolve(&options).unwrap();
        assert_eq!(
            descriptor.component("interop_hla").unwrap().requires.len(),
            2
        );

        assert_eq!(
            manifest.options(&[("os", "Windows"), ("fPIC", "True")]),
            Err(ResolutionError::OptionNotApplicable {
                name: crate::options::OptionName::Fpic,
                platform: Os::Windows,
            })
        );
    }

    #[test]
    fn test_conditional_requirement_must_be_external() {
        let text = MANIFEST.replace(r#"requires = "openrti:openrti""#, r#"requires = "base""#);
        let manifest = PackageManifest::from_toml_str(&text).unwrap();
        assert_eq!(
            manifest.rules(),
            Err(ResolutionError::InvalidExternalRequirement("base".to_string()))
        );
    }

    #[test]
    fn test_duplicate_spelling_in_manifest() {
        let text = MANIFEST.replace("[components.simulation]", "[components.MixrBase]");
        let manifest = PackageManifest::from_toml_str(&text).unwrap();
        assert_matches!(
            manifest.registry(),
            Err(ResolutionError::DuplicateComponent(_))
        );
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();
        let manifest = PackageManifest::load(file.path()).unwrap();
        assert_eq!(manifest.components.len(), 3);

        let missing = file.path().with_extension("missing");
        assert_matches!(
            PackageManifest::load(&missing),
            Err(ManifestError::Io(path, _)) if path == missing
        );
    }
}
