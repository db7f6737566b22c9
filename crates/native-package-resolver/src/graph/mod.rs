// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Builds and validates the requirement graph of a package.
//!
//! Resolution runs in a fixed sequence of steps:
//! 1. compute every artifact name through the [`NamingPolicy`], rejecting
//!    two components that would share one artifact;
//! 2. split declared requirements into internal ones, which must exist in
//!    the registry, and external ones, which are passed through;
//! 3. add the implicit requirement on the base component;
//! 4. add the option-conditional external requirements;
//! 5. reject cycles among internal requirements;
//! 6. assemble the [`PackageDescriptor`].
//!
//! Any failure aborts the whole resolution; no partial descriptor is ever
//! produced.

use crate::{
    component::{Component, ComponentKey, ExternalRequirement, Requirement},
    descriptor::{ComponentInfo, PackageDescriptor},
    error::{CyclePath, ResolutionError},
    naming::NamingPolicy,
    options::OptionModel,
    registry::ComponentRegistry,
    rules::{ConditionalRequirement, RequirementRules},
};
use indexmap::IndexMap;
use log::{debug, info};
use petgraph::{
    algo::{tarjan_scc, toposort},
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use std::collections::{BTreeMap, BTreeSet};


/// The internal requirement graph. Edges point from a component to the
/// components it requires.
type RequirementGraph = DiGraph<ComponentKey, ()>;

static NO_RULES: RequirementRules = RequirementRules::EMPTY;

/// Resolves a [`ComponentRegistry`] into a [`PackageDescriptor`].
///
/// The builder only borrows its inputs, so the same registry, naming policy
/// and rules can be resolved for several option models.
#[derive(Clone, Copy, Debug)]
pub struct DependencyGraphBuilder<'a> {
    registry: &'a ComponentRegistry,
    naming: &'a NamingPolicy,
    rules: &'a RequirementRules,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(registry: &'a ComponentRegistry, naming: &'a NamingPolicy) -> Self {
        Self {
            registry,
            naming,
            rules: &NO_RULES,
        }
    }

    pub fn with_rules(mut self, rules: &'a RequirementRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn build(&self, options: &OptionModel) -> Result<PackageDescriptor, ResolutionError> {
        self.check_rule_targets()?;
        let active_rules = self.rules.active(options);

        let mut graph = RequirementGraph::new();
        let nodes: IndexMap<ComponentKey, NodeIndex> = self
            .registry
            .all()
            .map(|component| {
                let key = component.key().clone();
                (key.clone(), graph.add_node(key))
            })
            .collect();

        let mut components = IndexMap::with_capacity(self.registry.len());
        let mut artifacts: BTreeMap<String, &ComponentKey> = BTreeMap::new();
        for component in self.registry.all() {
            let artifact_name = self.naming.artifact_name(component, options);
            if let Some(existing) = artifacts.insert(artifact_name.clone(), component.key()) {
                return Err(ResolutionError::DuplicateArtifact {
                    name: artifact_name,
                    components: [existing.clone(), component.key().clone()],
                });
            }
            let requires = self.resolve_requirements(component, &active_rules)?;
            for dependency in requires.iter().filter_map(Requirement::internal) {
                graph.add_edge(nodes[component.key()], nodes[dependency], ());
            }

            let display_name = self.registry.display_name(component.key());
            debug!(
                "Resolved {} as {} requiring [{}]",
                display_name,
                artifact_name,
                requires
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            components.insert(component.key().clone(), ComponentInfo {
                artifact_name,
                requires,
                display_name,
            });
        }

        let build_order = match toposort(&graph, None) {
            // Requirements point at their dependencies, so the reversed
            // topological order lists dependencies first.
            Ok(sorted) => sorted.into_iter().rev().map(|node| graph[node].clone()).collect(),
            Err(cycle) => {
                return Err(ResolutionError::CyclicDependency(find_cycle(
                    &graph,
                    cycle.node_id(),
                )));
            },
        };

        info!(
            "Resolved {} component(s) of package {} for {}",
            components.len(),
            self.registry.package(),
            options
        );
        Ok(PackageDescriptor::new(
            self.registry.package().to_string(),
            components,
            build_order,
        ))
    }

    /// Every rule must name a registered component, whether or not it is
    /// active for the current options.
    fn check_rule_targets(&self) -> Result<(), ResolutionError> {
        if let Some(base) = self.rules.base() {
            if !self.registry.contains(base) {
                return Err(match self.registry.all().next() {
                    Some(component) => ResolutionError::UnresolvedRequirement {
                        component: component.key().clone(),
                        missing: base.clone(),
                    },
                    None => ResolutionError::UnknownComponent(base.clone()),
                });
            }
        }
        for rule in self.rules.conditional() {
            if !self.registry.contains(&rule.component) {
                return Err(ResolutionError::UnknownComponent(rule.component.clone()));
            }
        }
        Ok(())
    }

    /// Declared internal requirements, then the implicit base requirement,
    /// then declared and conditional external requirements. Duplicates are
    /// dropped, keeping the first occurrence.
    fn resolve_requirements(
        &self,
        component: &Component,
        active_rules: &[&ConditionalRequirement],
    ) -> Result<Vec<Requirement>, ResolutionError> {
        let mut internal: Vec<ComponentKey> = Vec::new();
        let mut external: Vec<ExternalRequirement> = Vec::new();

        for requirement in component.requires() {
            match requirement {
                Requirement::Internal(key) => {
                    if !self.registry.contains(key) {
                        return Err(ResolutionError::UnresolvedRequirement {
                            component: component.key().clone(),
                            missing: key.clone(),
                        });
                    }
                    if !internal.contains(key) {
                        internal.push(key.clone());
                    }
                },
                Requirement::External(requirement) => {
                    if !external.contains(requirement) {
                        external.push(requirement.clone());
                    }
                },
            }
        }

        if let Some(base) = self.rules.base() {
            if component.key() != base && !internal.contains(base) {
                internal.push(base.clone());
            }
        }

        for rule in active_rules {
            if &rule.component == component.key() && !external.contains(&rule.requirement) {
                external.push(rule.requirement.clone());
            }
        }

        Ok(internal
            .into_iter()
            .map(Requirement::Internal)
            .chain(external.into_iter().map(Requirement::External))
            .collect())
    }
}

/// Recovers a full cycle through the strongly connected component that
/// contains `node`. The cycle starts at the earliest registered component of
/// that strongly connected component and follows requirements in
/// declaration order.
fn find_cycle(graph: &RequirementGraph, node: NodeIndex) -> CyclePath {
    let members: BTreeSet<NodeIndex> = tarjan_scc(graph)
        .into_iter()
        .find(|scc| scc.contains(&node))
        .unwrap_or_else(|| vec![node])
        .into_iter()
        .collect();
    let start = members.iter().next().copied().unwrap_or(node);

    let mut path = vec![start];
    let mut visited = BTreeSet::from([start]);
    if !extend_cycle(graph, &members, start, &mut visited, &mut path) {
        // Unreachable for a node reported by the topological sort, but keep
        // the offending node in the error regardless.
        path.push(start);
    }
    CyclePath::new(path.into_iter().map(|node| graph[node].clone()).collect())
}

fn extend_cycle(
    graph: &RequirementGraph,
    members: &BTreeSet<NodeIndex>,
    start: NodeIndex,
    visited: &mut BTreeSet<NodeIndex>,
    path: &mut Vec<NodeIndex>,
) -> bool {
    let current = path[path.len() - 1];
    let mut edges: Vec<_> = graph.edges(current).collect();
    edges.sort_by_key(|edge| edge.id());

    for edge in edges {
        let next = edge.target();
        if next == start {
            path.push(start);
            return true;
        }
        if members.contains(&next) && visited.insert(next) {
            path.push(next);
            if extend_cycle(graph, members, start, visited, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}
