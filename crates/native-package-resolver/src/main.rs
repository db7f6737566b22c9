// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use anyhow::{anyhow, Context, Result};
use aptos_native_package_resolver::{BuildType, OptionModel, PackageManifest};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a package for one set of options and print its package info.
    Resolve {
        #[clap(flatten)]
        manifest: ManifestArgs,

        /// Output format of the package info.
        #[clap(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Resolve a package for both Release and Debug builds and report errors.
    Check {
        #[clap(flatten)]
        manifest: ManifestArgs,
    },

    /// Print the resolved requirement graph as a Mermaid flowchart.
    Graph {
        #[clap(flatten)]
        manifest: ManifestArgs,
    },
}

#[derive(Debug, Parser)]
pub struct ManifestArgs {
    /// Path to the package manifest.
    #[clap(long, short, value_parser, default_value = "Package.toml")]
    manifest: PathBuf,

    /// A build option as `name=value`, e.g. `-o build_type=Debug`.
    /// May be repeated.
    #[clap(long = "option", short = 'o', value_parser = parse_option)]
    options: Vec<(String, String)>,
}

impl ManifestArgs {
    fn load(&self) -> Result<PackageManifest> {
        PackageManifest::load(&self.manifest)
            .with_context(|| format!("Failed to load {}", self.manifest.display()))
    }

    /// The command line options, with `build_type` overridden if given.
    fn options(
        &self,
        manifest: &PackageManifest,
        build_type: Option<BuildType>,
    ) -> Result<OptionModel> {
        let mut pairs = self.options.clone();
        if let Some(build_type) = build_type {
            pairs.retain(|(name, _)| !name.eq_ignore_ascii_case("build_type"));
            pairs.push(("build_type".to_string(), build_type.to_string()));
        }
        manifest.options(&pairs).context("Invalid build options")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Toml,
}

fn parse_option(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected `name=value`, got {:?}", raw))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match args.command {
        Command::Resolve { manifest, format } => {
            let package = manifest.load()?;
            let options = manifest.options(&package, None)?;
            let info = package
                .package_info(&options)
                .with_context(|| format!("Failed to resolve package {}", package.name()))?;
            let output = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&info)?,
                OutputFormat::Toml => toml::to_string_pretty(&info)?,
            };
            println!("{}", output);
        },
        Command::Check { manifest } => {
            let package = manifest.load()?;
            for build_type in [BuildType::Release, BuildType::Debug] {
                let options = manifest.options(&package, Some(build_type))?;
                let descriptor = package.resolve(&options).with_context(|| {
                    format!("Failed to resolve package {} for {}", package.name(), options)
                })?;
                info!(
                    "{} build of {}: {}",
                    build_type,
                    package.name(),
                    descriptor
                        .build_order()
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            println!("Package {} resolves cleanly", package.name());
        },
        Command::Graph { manifest } => {
            let package = manifest.load()?;
            let options = manifest.options(&package, None)?;
            let descriptor = package
                .resolve(&options)
                .with_context(|| format!("Failed to resolve package {}", package.name()))?;
            print!("{}", descriptor.to_mermaid());
        },
    }
    Ok(())
}
