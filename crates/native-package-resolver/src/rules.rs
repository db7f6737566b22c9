// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    component::{ComponentKey, ExternalRequirement},
    options::{Arch, BuildType, OptionModel, Os},
};
use serde::{Deserialize, Serialize};

/// A predicate over the option model.
///
/// An option that is not set never matches a value test, so `Shared(false)`
/// does not hold for a model without `shared`, while `Not(Shared(true))` does.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Always,
    BuildType(BuildType),
    Shared(bool),
    Fpic(bool),
    Os(Os),
    OsNot(Os),
    Arch(Arch),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn holds(&self, options: &OptionModel) -> bool {
        match self {
            Condition::Always => true,
            Condition::BuildType(build_type) => options.build_type() == Some(*build_type),
            Condition::Shared(shared) => options.is_shared() == Some(*shared),
            Condition::Fpic(fpic) => options.fpic() == Some(*fpic),
            Condition::Os(os) => options.os() == Some(*os),
            Condition::OsNot(os) => options.os() != Some(*os),
            Condition::Arch(arch) => options.arch() == Some(*arch),
            Condition::All(conditions) => conditions.iter().all(|c| c.holds(options)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.holds(options)),
            Condition::Not(condition) => !condition.holds(options),
        }
    }
}

/// Adds `requirement` to `component` whenever `when` holds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionalRequirement {
    pub component: ComponentKey,
    pub when: Condition,
    pub requirement: ExternalRequirement,
}

/// Every component other than `base` implicitly requires `base`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DefaultEdgeRule {
    pub base: ComponentKey,
}

/// The requirement rules applied on top of the declared requirements.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequirementRules {
    default_edge: Option<DefaultEdgeRule>,
    conditional: Vec<ConditionalRequirement>,
}

impl RequirementRules {
    pub(crate) const EMPTY: Self = Self {
        default_edge: None,
        conditional: Vec::new(),
    };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: ComponentKey) -> Self {
        self.default_edge = Some(DefaultEdgeRule { base });
        self
    }

    pub fn with_conditional(
        mut self,
        component: ComponentKey,
        when: Condition,
        requirement: ExternalRequirement,
    ) -> Self {
        self.conditional.push(ConditionalRequirement {
            component,
            when,
            requirement,
        });
        self
    }

    pub fn base(&self) -> Option<&ComponentKey> {
        self.default_edge.as_ref().map(|rule| &rule.base)
    }

    pub fn conditional(&self) -> &[ConditionalRequirement] {
        &self.conditional
    }

    /// The conditional requirements that hold under `options`, in
    /// declaration order.
    pub fn active<'a>(&'a self, options: &OptionModel) -> Vec<&'a ConditionalRequirement> {
        self.conditional
            .iter()
            .filter(|rule| rule.when.holds(options))
            .collect()
    }
}
