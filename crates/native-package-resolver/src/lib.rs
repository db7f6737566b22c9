// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Component resolution for multi-library native packages.
//!
//! A native package (for example a simulation framework shipped as a set of
//! static libraries) declares its components and the requirements between
//! them. This crate turns those declarations, together with one set of build
//! options, into a [`PackageDescriptor`]: the artifact name of every
//! component, its fully resolved requirements, and a validated build order.
//!
//! The usual entry point is a [`PackageManifest`] loaded from a
//! `Package.toml` file. The lower-level pieces ([`ComponentRegistry`],
//! [`NamingPolicy`], [`RequirementRules`] and [`DependencyGraphBuilder`]) can
//! also be assembled directly.

pub mod component;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod naming;
pub mod options;
pub mod registry;
pub mod rules;

pub use component::{Component, ComponentKey, ExternalRequirement, Requirement};
pub use descriptor::{
    ComponentInfo, ComponentRecord, ExternalPackageRecord, PackageDescriptor, PackageInfo,
};
pub use error::{CyclePath, ManifestError, ResolutionError};
pub use graph::DependencyGraphBuilder;
pub use manifest::PackageManifest;
pub use naming::{NamingConvention, NamingPolicy, NamingStrategy, DEBUG_SUFFIX};
pub use options::{Arch, BuildType, OptionModel, OptionName, OptionValue, Os};
pub use registry::ComponentRegistry;
pub use rules::{Condition, RequirementRules};
