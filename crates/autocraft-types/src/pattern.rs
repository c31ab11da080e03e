//! Production patterns.
//!
//! A [`Pattern`] consumes a fixed list of inputs and produces a fixed list
//! of outputs, one of which is designated the primary output. The pattern
//! index files a pattern under its primary output's key. Patterns run a
//! whole number of times: there is no fractional invocation.
//!
//! Construction validates the pattern, so every `Pattern` value in the
//! system has at least one output and only strictly positive amounts.

use serde::Serialize;

use crate::ids::PatternId;
use crate::key::ResourceKey;
use crate::stack::ResourceStack;

/// Errors raised when a pattern is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// A pattern must produce something.
    #[error("pattern has no outputs")]
    NoOutputs,

    /// An output amount was zero or negative.
    #[error("pattern output {key} has non-positive amount {amount}")]
    NonPositiveOutput {
        /// The offending output key.
        key: ResourceKey,
        /// The rejected amount.
        amount: i64,
    },

    /// An input amount was zero or negative.
    #[error("pattern input {key} has non-positive amount {amount}")]
    NonPositiveInput {
        /// The offending input key.
        key: ResourceKey,
        /// The rejected amount.
        amount: i64,
    },

    /// The primary-output index does not name an output.
    #[error("primary output index {index} out of range (pattern has {outputs} outputs)")]
    PrimaryOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of outputs in the pattern.
        outputs: usize,
    },
}

/// A validated production rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pattern {
    /// Unique id, assigned at construction.
    id: PatternId,
    /// Consumed per invocation, in declaration order.
    inputs: Vec<ResourceStack>,
    /// Produced per invocation, in declaration order.
    outputs: Vec<ResourceStack>,
    /// Index of the primary output within `outputs`.
    primary_index: usize,
    /// Copy of `outputs[primary_index]`.
    primary: ResourceStack,
}

impl Pattern {
    /// Build a pattern whose primary output is the first output.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern has no outputs or any amount
    /// is not strictly positive.
    pub fn new(
        inputs: Vec<ResourceStack>,
        outputs: Vec<ResourceStack>,
    ) -> Result<Self, PatternError> {
        Self::with_primary(inputs, outputs, 0)
    }

    /// Build a pattern with an explicit primary-output index.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern has no outputs, any amount is
    /// not strictly positive, or `primary_index` is out of range.
    pub fn with_primary(
        inputs: Vec<ResourceStack>,
        outputs: Vec<ResourceStack>,
        primary_index: usize,
    ) -> Result<Self, PatternError> {
        if outputs.is_empty() {
            return Err(PatternError::NoOutputs);
        }
        if let Some(bad) = outputs.iter().find(|s| !s.is_positive()) {
            return Err(PatternError::NonPositiveOutput {
                key: bad.key.clone(),
                amount: bad.amount,
            });
        }
        if let Some(bad) = inputs.iter().find(|s| !s.is_positive()) {
            return Err(PatternError::NonPositiveInput {
                key: bad.key.clone(),
                amount: bad.amount,
            });
        }
        let primary = outputs
            .get(primary_index)
            .cloned()
            .ok_or(PatternError::PrimaryOutOfRange {
                index: primary_index,
                outputs: outputs.len(),
            })?;

        Ok(Self {
            id: PatternId::new(),
            inputs,
            outputs,
            primary_index,
            primary,
        })
    }

    /// The pattern's id.
    pub const fn id(&self) -> PatternId {
        self.id
    }

    /// Inputs consumed per invocation.
    pub fn inputs(&self) -> &[ResourceStack] {
        &self.inputs
    }

    /// Outputs produced per invocation.
    pub fn outputs(&self) -> &[ResourceStack] {
        &self.outputs
    }

    /// The primary output.
    pub const fn primary_output(&self) -> &ResourceStack {
        &self.primary
    }

    /// Outputs other than the primary one.
    pub fn byproducts(&self) -> impl Iterator<Item = &ResourceStack> {
        let primary_index = self.primary_index;
        self.outputs
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != primary_index)
            .map(|(_, s)| s)
    }

    /// Total units of `key` produced per invocation, summed over every
    /// output line naming it. Saturates at `u64::MAX`.
    pub fn output_amount(&self, key: &ResourceKey) -> u64 {
        sum_for(&self.outputs, key)
    }

    /// Total units of `key` consumed per invocation, summed over every
    /// input line naming it. Saturates at `u64::MAX`.
    pub fn input_amount(&self, key: &ResourceKey) -> u64 {
        sum_for(&self.inputs, key)
    }
}

fn sum_for(stacks: &[ResourceStack], key: &ResourceKey) -> u64 {
    stacks
        .iter()
        .filter(|s| &s.key == key)
        .filter_map(ResourceStack::quantity)
        .fold(0_u64, u64::saturating_add)
}
