// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::component::{ComponentKey, Requirement};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt::Write,
};

/// The resolved view of one component.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ComponentInfo {
    pub artifact_name: String,
    /// Declared internal requirements, then the implicit base requirement,
    /// then external requirements.
    pub requires: Vec<Requirement>,
    pub display_name: String,
}

/// The validated, read-only description of a package for one build
/// configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PackageDescriptor {
    package: String,
    components: IndexMap<ComponentKey, ComponentInfo>,
    build_order: Vec<ComponentKey>,
}

impl PackageDescriptor {
    pub(crate) fn new(
        package: String,
        components: IndexMap<ComponentKey, ComponentInfo>,
        build_order: Vec<ComponentKey>,
    ) -> Self {
        Self {
            package,
            components,
            build_order,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Components in registration order.
    pub fn components(&self) -> impl Iterator<Item = (&ComponentKey, &ComponentInfo)> {
        self.components.iter()
    }

    pub fn get(&self, key: &ComponentKey) -> Option<&ComponentInfo> {
        self.components.get(key)
    }

    /// Looks up a component by its canonical key text, e.g. `interop_hla`.
    pub fn component(&self, key: &str) -> Option<&ComponentInfo> {
        self.components
            .iter()
            .find(|(candidate, _)| candidate.as_str() == key)
            .map(|(_, info)| info)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components ordered so that every component comes after its internal
    /// requirements.
    pub fn build_order(&self) -> &[ComponentKey] {
        &self.build_order
    }

    /// The persisted package-info record handed to the toolchain layer.
    pub fn to_package_info(&self) -> PackageInfo {
        let components = self
            .components
            .iter()
            .map(|(key, info)| {
                (key.to_string(), ComponentRecord {
                    artifact_name: info.artifact_name.clone(),
                    requires: info.requires.iter().map(ToString::to_string).collect(),
                    display_name: info.display_name.clone(),
                })
            })
            .collect();
        PackageInfo {
            package: self.package.clone(),
            version: None,
            components,
            external: BTreeMap::new(),
        }
    }

    /// Renders the resolved graph as a Mermaid flowchart.
    pub fn to_mermaid(&self) -> String {
        let mut mermaid = String::from("flowchart TD\n");
        let mut node_ids = BTreeMap::new();

        // Assign a simple identifier to each component
        for (index, (key, info)) in self.components.iter().enumerate() {
            let id = format!("N{}", index);
            let _ = writeln!(
                &mut mermaid,
                "    {}[\"{}<br><br>{}\"]",
                id, info.display_name, info.artifact_name
            );
            node_ids.insert(key.clone(), id);
        }

        // External requirements become leaf nodes, shared between components
        let mut external_ids = BTreeMap::new();
        for info in self.components.values() {
            for requirement in &info.requires {
                if let Requirement::External(external) = requirement {
                    let next_id = format!("E{}", external_ids.len());
                    if let Entry::Vacant(entry) = external_ids.entry(external.clone()) {
                        let _ = writeln!(&mut mermaid, "    {}([\"{}\"])", next_id, external);
                        entry.insert(next_id);
                    }
                }
            }
        }

        // Add edges
        for (key, info) in &self.components {
            let source = &node_ids[key];
            for requirement in &info.requires {
                let target = match requirement {
                    Requirement::Internal(dependency) => node_ids.get(dependency),
                    Requirement::External(external) => external_ids.get(external),
                };
                if let Some(target) = target {
                    let _ = writeln!(&mut mermaid, "    {} --> {}", source, target);
                }
            }
        }

        mermaid
    }
}

/// The persisted package-info record: the stable contract consumed by the
/// toolchain layer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub components: IndexMap<String, ComponentRecord>,
    /// External packages declared by the package, keyed by package name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external: BTreeMap<String, ExternalPackageRecord>,
}

impl PackageInfo {
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_external(mut self, external: BTreeMap<String, ExternalPackageRecord>) -> Self {
        self.external = external;
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExternalPackageRecord {
    pub version: String,
    /// Consumers of the package also need the headers of this package.
    pub transitive_headers: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub artifact_name: String,
    pub requires: Vec<String>,
    pub display_name: String,
}
