use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use rand::Rng;
use rand::prelude::IteratorRandom;
use serde::{Deserialize, Serialize};

use super::smoothing::{DISCOUNT, Smoothing};
use super::state::State;

/// Anything that can be modelled as a sequence element.
///
/// The character variant instantiates this with `char`, the word
/// variant with `String`. `Ord` is only needed for deterministic
/// tie-breaking in the statistics snapshot.
pub trait Token: Clone + Eq + Hash + Ord + Debug {}

impl<T: Clone + Eq + Hash + Ord + Debug> Token for T {}

/// Read-only statistics snapshot of a trained model.
///
/// `most_common` holds the top-k (context, continuation) pairs rendered
/// as display strings, ranked by count descending with a lexicographic
/// tie-break so the ordering is deterministic.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModelStats {
	pub vocab_size: usize,
	pub total_ngrams: usize,
	pub unique_contexts: usize,
	pub total_tokens: usize,
	pub most_common: Vec<(String, usize)>,
}

/// An n-gram model over an arbitrary token type.
///
/// Counts every continuation observed after each (n-1)-token context,
/// estimates `P(token | context)` under the smoothing policy fixed at
/// construction, and samples new sequences from those estimates.
///
/// # Responsibilities
/// - Accumulate n-gram counts from token sequences (append-only)
/// - Estimate continuation probabilities (MLE, Laplace, or discounted back-off)
/// - Generate sequences by weighted sampling over the vocabulary
/// - Merge with another model of the same order and smoothing
///
/// # Invariants
/// - `n` is always >= 1
/// - Each context total equals the sum of its continuation counts
/// - Every continuation token is a member of `vocab`
/// - `total_tokens` equals the sum of all unigram counts
///
/// Training mutates the model; probability queries and generation are
/// read-only, so a fully trained model can be shared freely.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: serde::de::DeserializeOwned"))]
pub struct NGramModel<T: Token> {
	/// The order of the model (context length is n-1)
	n: usize, // must be >= 1

	/// Smoothing policy used by every probability estimate
	smoothing: Smoothing,

	/// Mapping from a context (length n-1) to its frequency table
	states: HashMap<Vec<T>, State<T>>,

	/// Global continuation frequencies, the back-off base case
	unigrams: HashMap<T, usize>,

	/// Every distinct continuation token observed across training
	vocab: HashSet<T>,

	/// First context of every trained sequence, drawn uniformly when
	/// generation starts without a seed
	start_contexts: Vec<Vec<T>>,

	/// Total number of continuation observations
	total_tokens: usize,
}

impl<T: Token> NGramModel<T> {
	/// Creates a new n-gram model of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 1`. This is the only fatal condition in
	/// the whole model lifecycle; training and generation degrade
	/// gracefully instead of failing.
	pub fn new(n: usize, smoothing: Smoothing) -> Result<Self, String> {
		if n < 1 {
			return Err("n must be >= 1".to_owned());
		}
		Ok(Self {
			n,
			smoothing,
			states: HashMap::new(),
			unigrams: HashMap::new(),
			vocab: HashSet::new(),
			start_contexts: Vec::new(),
			total_tokens: 0,
		})
	}

	/// Returns the order of the model.
	pub fn n(&self) -> usize {
		self.n
	}

	/// Returns the smoothing policy fixed at construction.
	pub fn smoothing(&self) -> Smoothing {
		self.smoothing
	}

	/// Trains on one token sequence, boundary markers included.
	///
	/// Every window of `n` consecutive tokens contributes one count:
	/// the first n-1 tokens form the context, the nth the continuation.
	/// Sequences shorter than `n` are skipped entirely — no partial
	/// n-grams are recorded — and empty input is a no-op.
	pub fn add_sequence(&mut self, tokens: &[T]) {
		if tokens.len() < self.n {
			return;
		}

		self.start_contexts.push(tokens[..self.n - 1].to_vec());

		for window in tokens.windows(self.n) {
			let (context, continuation) = window.split_at(self.n - 1);
			let token = &continuation[0];

			let state = self.states.entry(context.to_vec()).or_insert_with(State::new);
			state.observe(token.clone());
			*self.unigrams.entry(token.clone()).or_insert(0) += 1;
			self.vocab.insert(token.clone());
			self.total_tokens += 1;
		}
	}

	/// Returns how many times `token` was observed after `context`.
	pub fn count(&self, context: &[T], token: &T) -> usize {
		self.states.get(context).map(|state| state.count(token)).unwrap_or(0)
	}

	/// Returns the total number of observations for `context`.
	pub fn context_total(&self, context: &[T]) -> usize {
		self.states.get(context).map(State::total).unwrap_or(0)
	}

	/// Estimates `P(token | context)` under the configured smoothing.
	///
	/// Always returns a finite value in [0, 1]. An unseen context is
	/// never an error: MLE yields 0, Laplace a uniform-ish floor, and
	/// the back-off estimator recurses into shorter contexts.
	pub fn probability(&self, context: &[T], token: &T) -> f64 {
		match self.smoothing {
			Smoothing::MaximumLikelihood => self.mle_probability(context, token),
			Smoothing::Laplace => self.laplace_probability(context, token),
			Smoothing::KneserNey => self.kneser_ney_probability(context, token),
		}
	}

	/// Raw relative frequency, zero for unseen contexts.
	fn mle_probability(&self, context: &[T], token: &T) -> f64 {
		match self.states.get(context) {
			Some(state) if state.total() > 0 => state.count(token) as f64 / state.total() as f64,
			_ => 0.0,
		}
	}

	/// Additive smoothing: `(count + 1) / (total + |vocab|)`.
	fn laplace_probability(&self, context: &[T], token: &T) -> f64 {
		let (count, total) = match self.states.get(context) {
			Some(state) => (state.count(token), state.total()),
			None => (0, 0),
		};
		let denominator = total + self.vocab.len();
		if denominator == 0 {
			// Untrained model, nothing to flatten
			return 0.0;
		}
		(count + 1) as f64 / denominator as f64
	}

	/// Discounted back-off with interpolation.
	///
	/// Subtracts a fixed discount from the raw count, floored at zero,
	/// and redistributes the removed mass to the same token's estimate
	/// under the context with its leftmost token dropped. The recursion
	/// terminates because the context strictly shrinks; the empty
	/// context falls back to the global unigram frequency. A context
	/// with zero total contributes nothing of its own and defers
	/// entirely to the lower order.
	fn kneser_ney_probability(&self, context: &[T], token: &T) -> f64 {
		if context.is_empty() {
			if self.total_tokens == 0 {
				return 0.0;
			}
			return self.unigrams.get(token).copied().unwrap_or(0) as f64 / self.total_tokens as f64;
		}

		let lower_order = self.kneser_ney_probability(&context[1..], token);

		let Some(state) = self.states.get(context) else {
			return lower_order;
		};
		let total = state.total();
		if total == 0 {
			return lower_order;
		}

		let higher_order = (state.count(token) as f64 - DISCOUNT).max(0.0) / total as f64;
		let lambda = (DISCOUNT * state.distinct_continuations() as f64) / total as f64;

		higher_order + lambda * lower_order
	}

	/// Samples the next token for `context` by weighted random selection.
	///
	/// Enumerates the vocabulary, keeps tokens with strictly positive
	/// probability, and draws uniformly over the accumulated mass.
	/// Returns `None` when no candidate exists, which callers treat as
	/// normal early termination.
	pub fn next_token(&self, context: &[T]) -> Option<T> {
		let mut candidates: Vec<(&T, f64)> = Vec::new();
		let mut total_mass = 0.0;
		for token in &self.vocab {
			let p = self.probability(context, token);
			if p > 0.0 {
				total_mass += p;
				candidates.push((token, p));
			}
		}

		if candidates.is_empty() || total_mass <= 0.0 {
			return None;
		}

		let mut draw = rand::rng().random_range(0.0..total_mass);
		for (token, p) in &candidates {
			if draw < *p {
				return Some((*token).clone());
			}
			draw -= p;
		}

		// Floating-point rounding can exhaust the scan; any candidate is valid
		candidates.last().map(|(token, _)| (*token).clone())
	}

	/// Generates up to `max_length` tokens.
	///
	/// The sliding context starts from `seed` (right-truncated and
	/// left-padded with `start_marker` to exactly n-1 tokens), else
	/// from a uniform draw over recorded start contexts, else from an
	/// all-marker context. Sampling the `end_marker` stops generation
	/// without appending it. The seed itself is not part of the result.
	pub fn generate(&self, max_length: usize, seed: Option<&[T]>, start_marker: &T, end_marker: &T) -> Vec<T> {
		let mut context: Vec<T> = match seed {
			Some(seed) => {
				let keep = seed.len().min(self.n - 1);
				let mut context = vec![start_marker.clone(); self.n - 1 - keep];
				context.extend_from_slice(&seed[seed.len() - keep..]);
				context
			}
			None => match self.start_contexts.iter().choose(&mut rand::rng()) {
				Some(context) => context.clone(),
				None => vec![start_marker.clone(); self.n - 1],
			},
		};

		let mut generated = Vec::new();
		for _ in 0..max_length {
			let Some(token) = self.next_token(&context) else {
				break;
			};
			if token == *end_marker {
				break;
			}
			if !context.is_empty() {
				context.remove(0);
				context.push(token.clone());
			}
			generated.push(token);
		}
		generated
	}

	/// Returns the number of distinct continuation tokens seen.
	pub fn vocab_size(&self) -> usize {
		self.vocab.len()
	}

	/// Returns the number of distinct (context, continuation) pairs.
	pub fn total_ngrams(&self) -> usize {
		self.states.values().map(State::distinct_continuations).sum()
	}

	/// Returns the number of distinct contexts.
	pub fn unique_contexts(&self) -> usize {
		self.states.len()
	}

	/// Returns the total number of continuation observations.
	pub fn total_tokens(&self) -> usize {
		self.total_tokens
	}

	/// Returns the k most frequent (context, continuation, count)
	/// triples, count descending, ties broken lexicographically.
	pub fn top_ngrams(&self, k: usize) -> Vec<(Vec<T>, T, usize)> {
		let mut all: Vec<(Vec<T>, T, usize)> = self
			.states
			.iter()
			.flat_map(|(context, state)| {
				state
					.pairs()
					.map(|(token, count)| (context.clone(), token.clone(), count))
			})
			.collect();

		all.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| (&a.0, &a.1).cmp(&(&b.0, &b.1))));
		all.truncate(k);
		all
	}

	/// Perplexity over held-out, already padded sequences.
	///
	/// Exponentiated average negative log2-probability across every
	/// scorable window. Returns infinity when no window is scorable
	/// (untrained model, or everything shorter than n).
	pub fn perplexity(&self, sequences: &[Vec<T>]) -> f64 {
		let mut log_prob = 0.0;
		let mut scored = 0usize;

		for sequence in sequences {
			if sequence.len() < self.n {
				continue;
			}
			for i in (self.n - 1)..sequence.len() {
				let context = &sequence[i + 1 - self.n..i];
				let p = self.probability(context, &sequence[i]);
				if p > 0.0 {
					log_prob += p.log2();
					scored += 1;
				}
			}
		}

		if scored == 0 {
			return f64::INFINITY;
		}
		2f64.powf(-(log_prob / scored as f64))
	}

	/// Merges another model into this one by summing all count tables.
	///
	/// Intended for chunked corpus ingestion, where partial models are
	/// built independently and combined.
	///
	/// # Errors
	/// Returns an error if the orders or smoothing policies differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.n != other.n {
			return Err("N mismatch".to_owned());
		}
		if self.smoothing != other.smoothing {
			return Err("Smoothing mismatch".to_owned());
		}

		for (context, state) in &other.states {
			if let Some(existing) = self.states.get_mut(context) {
				existing.merge(state);
			} else {
				self.states.insert(context.clone(), state.clone());
			}
		}
		for (token, count) in &other.unigrams {
			*self.unigrams.entry(token.clone()).or_insert(0) += *count;
		}
		self.vocab.extend(other.vocab.iter().cloned());
		self.start_contexts.extend(other.start_contexts.iter().cloned());
		self.total_tokens += other.total_tokens;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use float_cmp::assert_approx_eq;
	use rstest::rstest;

	fn char_seq(word: &str) -> Vec<char> {
		word.chars().collect()
	}

	fn trained(n: usize, smoothing: Smoothing, words: &[&str]) -> NGramModel<char> {
		let mut model = NGramModel::new(n, smoothing).unwrap();
		for word in words {
			model.add_sequence(&char_seq(word));
		}
		model
	}

	#[test]
	fn order_zero_is_rejected_at_construction() {
		assert!(NGramModel::<char>::new(0, Smoothing::KneserNey).is_err());
		assert!(NGramModel::<char>::new(1, Smoothing::KneserNey).is_ok());
	}

	#[test]
	fn short_sequences_are_skipped_entirely() {
		let model = trained(4, Smoothing::MaximumLikelihood, &["ab"]);
		assert_eq!(model.total_tokens(), 0);
		assert_eq!(model.unique_contexts(), 0);
		assert_eq!(model.vocab_size(), 0);
	}

	#[test]
	fn empty_input_is_a_no_op() {
		let mut model: NGramModel<char> = NGramModel::new(2, Smoothing::KneserNey).unwrap();
		model.add_sequence(&[]);
		assert_eq!(model.total_tokens(), 0);
	}

	#[test]
	fn context_totals_match_summed_counts() {
		let model = trained(3, Smoothing::MaximumLikelihood, &["^abab$", "^abba$"]);
		for (context, _, _) in model.top_ngrams(usize::MAX) {
			let summed: usize = model
				.vocab
				.iter()
				.map(|token| model.count(&context, token))
				.sum();
			assert_eq!(model.context_total(&context), summed);
		}
	}

	#[test]
	fn mle_of_unseen_context_is_zero() {
		let model = trained(3, Smoothing::MaximumLikelihood, &["^molo$"]);
		assert_eq!(model.probability(&char_seq("zz"), &'a'), 0.0);
	}

	#[test]
	fn laplace_normalizes_over_vocabulary() {
		let model = trained(3, Smoothing::Laplace, &["^molo$", "^mholo$"]);
		let context = char_seq("^m");
		let total: f64 = model
			.vocab
			.iter()
			.map(|token| model.probability(&context, token))
			.sum();
		// Only sums to 1 when every vocabulary token contributes a +1
		assert_approx_eq!(f64, total, 1.0, epsilon = 1e-9);
	}

	#[test]
	fn laplace_is_positive_for_unseen_continuations() {
		let model = trained(3, Smoothing::Laplace, &["^molo$"]);
		assert!(model.probability(&char_seq("^m"), &'$') > 0.0);
	}

	#[rstest]
	#[case("")]
	#[case("o")]
	#[case("lo")]
	#[case("zzz")]
	#[case("^mo")]
	fn back_off_terminates_for_any_context_length(#[case] context: &str) {
		let model = trained(4, Smoothing::KneserNey, &["^molo$", "^mholo$", "^unjani$"]);
		for token in &model.vocab {
			let p = model.probability(&char_seq(context), token);
			assert!(p.is_finite());
			assert!((0.0..=1.0).contains(&p), "p = {} out of range", p);
		}
	}

	#[test]
	fn back_off_of_unseen_context_uses_unigram_mass() {
		let model = trained(4, Smoothing::KneserNey, &["^molo$"]);
		// "zzz" was never observed, but 'o' has unigram mass
		assert!(model.probability(&char_seq("zzz"), &'o') > 0.0);
	}

	#[test]
	fn vocabulary_grows_monotonically() {
		let mut model = trained(2, Smoothing::MaximumLikelihood, &["^molo$"]);
		let before: HashSet<char> = model.vocab.iter().copied().collect();
		model.add_sequence(&char_seq("^unjani$"));
		assert!(model.vocab.is_superset(&before));
	}

	#[test]
	fn generation_respects_length_bound() {
		let model = trained(3, Smoothing::KneserNey, &["^molo$", "^unjani$", "^enkosi$"]);
		for max_length in [0, 1, 3, 8] {
			let out = model.generate(max_length, None, &'^', &'$');
			assert!(out.len() <= max_length);
		}
	}

	#[test]
	fn generation_on_empty_model_yields_nothing() {
		let model: NGramModel<char> = NGramModel::new(3, Smoothing::KneserNey).unwrap();
		assert!(model.generate(10, None, &'^', &'$').is_empty());
	}

	#[test]
	fn seed_is_truncated_and_padded_to_context_length() {
		let model = trained(3, Smoothing::MaximumLikelihood, &["^molo$"]);
		// Longer seed than n-1: only the last 2 tokens matter
		let out = model.generate(5, Some(&char_seq("^mo")), &'^', &'$');
		// From context "mo" the only continuation chain is l -> o -> $
		assert_eq!(out, char_seq("lo"));
	}

	#[test]
	fn top_ngrams_are_sorted_and_deterministic() {
		let model = trained(2, Smoothing::MaximumLikelihood, &["^aaab$", "^aab$"]);
		let first = model.top_ngrams(5);
		let second = model.top_ngrams(5);
		assert_eq!(first, second);
		for pair in first.windows(2) {
			assert!(pair[0].2 >= pair[1].2);
		}
		// ('a' -> 'a') occurs 3 times, more than any other pair
		assert_eq!(first[0], (vec!['a'], 'a', 3));
	}

	#[test]
	fn merge_requires_matching_configuration() {
		let mut left = trained(2, Smoothing::KneserNey, &["^ab$"]);
		let other_n = trained(3, Smoothing::KneserNey, &["^ab$"]);
		let other_smoothing = trained(2, Smoothing::Laplace, &["^ab$"]);
		assert!(left.merge(&other_n).is_err());
		assert!(left.merge(&other_smoothing).is_err());
	}

	#[test]
	fn merge_sums_counts_and_preserves_probabilities() {
		let mut merged = trained(2, Smoothing::MaximumLikelihood, &["^ab$"]);
		merged.merge(&trained(2, Smoothing::MaximumLikelihood, &["^ab$", "^ac$"])).unwrap();

		let mut whole = trained(2, Smoothing::MaximumLikelihood, &["^ab$", "^ab$", "^ac$"]);
		whole.start_contexts.sort();
		merged.start_contexts.sort();

		assert_eq!(merged.total_tokens(), whole.total_tokens());
		for token in &whole.vocab {
			assert_approx_eq!(
				f64,
				merged.probability(&['a'], token),
				whole.probability(&['a'], token),
				epsilon = 1e-12
			);
		}
	}

	#[test]
	fn perplexity_is_infinite_without_scorable_windows() {
		let model: NGramModel<char> = NGramModel::new(3, Smoothing::MaximumLikelihood).unwrap();
		assert!(model.perplexity(&[char_seq("^molo$")]).is_infinite());
	}

	#[test]
	fn perplexity_of_training_data_is_finite() {
		let model = trained(3, Smoothing::KneserNey, &["^molo$", "^mholo$"]);
		let ppl = model.perplexity(&[char_seq("^molo$")]);
		assert!(ppl.is_finite());
		assert!(ppl >= 1.0);
	}
}
