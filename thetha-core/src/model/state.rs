use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ngram_model::Token;

/// Frequency table for a single context of an n-gram model.
///
/// A `State` stores every continuation token observed immediately after
/// one fixed (n-1)-token context, together with a cached sum of all
/// counts (the denominator of every probability estimate over this
/// context).
///
/// ## Responsibilities
/// - Accumulate continuation occurrences during training
/// - Answer count / total / distinct-continuation queries in O(1)
/// - Merge with another state for the same context (chunked corpus ingestion)
///
/// ## Invariants
/// - `total` always equals the sum of all values in `continuations`
/// - Every continuation count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: serde::de::DeserializeOwned"))]
pub(crate) struct State<T: Token> {
	/// Observed continuations indexed by token.
	/// The value is how many times the token followed this context.
	continuations: HashMap<T, usize>,
	/// Cached sum of all continuation counts.
	total: usize,
}

impl<T: Token> State<T> {
	/// Creates an empty frequency table.
	pub(crate) fn new() -> Self {
		Self {
			continuations: HashMap::new(),
			total: 0,
		}
	}

	/// Records one occurrence of `token` after this state's context.
	///
	/// The cached total is updated in the same call, so the invariant
	/// `total == sum(continuations)` holds after every increment.
	pub(crate) fn observe(&mut self, token: T) {
		*self.continuations.entry(token).or_insert(0) += 1;
		self.total += 1;
	}

	/// Returns how many times `token` was observed after this context.
	pub(crate) fn count(&self, token: &T) -> usize {
		self.continuations.get(token).copied().unwrap_or(0)
	}

	/// Returns the sum of all continuation counts.
	pub(crate) fn total(&self) -> usize {
		self.total
	}

	/// Returns the number of distinct continuation tokens.
	///
	/// Only the cardinality is ever consumed (back-off interpolation
	/// weight); the key set of `continuations` is that set.
	pub(crate) fn distinct_continuations(&self) -> usize {
		self.continuations.len()
	}

	/// Iterates over `(token, count)` pairs.
	pub(crate) fn pairs(&self) -> impl Iterator<Item = (&T, usize)> {
		self.continuations.iter().map(|(token, count)| (token, *count))
	}

	/// Merges another state into this one by summing counts.
	///
	/// Both states must belong to the same context; the caller (the
	/// model's context table) guarantees it.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (token, count) in &other.continuations {
			*self.continuations.entry(token.clone()).or_insert(0) += *count;
		}
		self.total += other.total;
	}
}
