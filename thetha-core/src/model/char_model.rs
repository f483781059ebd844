use std::path::Path;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use super::ngram_model::{ModelStats, NGramModel};
use super::phonology;
use super::smoothing::Smoothing;
use crate::corpus;
use crate::io::{build_output_path, read_file};

/// Marker prepended to every training word.
pub const START_CHAR: char = '^';
/// Marker appended to every training word; sampling it ends a word.
pub const END_CHAR: char = '$';

/// Retry budget for a single word generation before falling back.
const MAX_ATTEMPTS: usize = 10;
/// Attempt multiplier for batch generation.
const BATCH_ATTEMPT_FACTOR: usize = 20;
/// Batch generation only keeps words at least this long.
const MIN_KEPT_LEN: usize = 3;

/// Character-level n-gram model generating morphologically plausible
/// Xhosa words.
///
/// Wraps the generic [`NGramModel`] with word boundary handling,
/// phonological repair of generated candidates, and the bounded
/// retry-then-fallback policy that guarantees non-empty output.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CharModel {
	model: NGramModel<char>,
	/// Words shorter than this are excluded from training entirely,
	/// keeping degenerate contexts out of the counts.
	min_word_len: usize,
}

impl CharModel {
	/// Creates an untrained character model of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize, smoothing: Smoothing) -> Result<Self, String> {
		Ok(Self {
			model: NGramModel::new(n, smoothing)?,
			min_word_len: 2,
		})
	}

	/// Overrides the minimum trainable word length (default 2).
	pub fn with_min_word_len(mut self, min_word_len: usize) -> Self {
		self.min_word_len = min_word_len;
		self
	}

	/// Returns the order of the model.
	pub fn n(&self) -> usize {
		self.model.n()
	}

	/// Trains on free text, one padded word at a time.
	///
	/// The corpus is lowercased and split on whitespace; each surviving
	/// word is padded as `^word$` before counting.
	pub fn train(&mut self, corpus: &str) {
		for word in corpus.to_lowercase().split_whitespace() {
			if word.chars().count() < self.min_word_len {
				continue;
			}
			let mut padded = Vec::with_capacity(word.chars().count() + 2);
			padded.push(START_CHAR);
			padded.extend(word.chars());
			padded.push(END_CHAR);
			self.model.add_sequence(&padded);
		}
	}

	/// Estimates `P(next | context)` under the configured smoothing.
	pub fn probability(&self, context: &str, next: char) -> f64 {
		let context: Vec<char> = context.chars().collect();
		self.model.probability(&context, &next)
	}

	/// Generates one word of at most `max_length` characters.
	///
	/// Tries up to 10 times to produce a phonologically valid word of
	/// at least 2 characters, optionally continuing `start_pattern`.
	/// When every attempt fails (including on an untrained model), a
	/// curated fallback word is returned instead — never empty output.
	pub fn generate_word(&self, max_length: usize, start_pattern: Option<&str>) -> String {
		let seed: Option<(Vec<char>, String)> = start_pattern.map(|pattern| {
			let pattern = pattern.to_lowercase();
			let mut seed = vec![START_CHAR];
			seed.extend(pattern.chars());
			(seed, pattern)
		});

		for _ in 0..MAX_ATTEMPTS {
			let (seed_context, prefix) = match &seed {
				Some((context, prefix)) => (Some(context.as_slice()), prefix.as_str()),
				None => (None, ""),
			};
			let generated = self.model.generate(max_length, seed_context, &START_CHAR, &END_CHAR);
			let word: String = prefix.chars().chain(generated).collect();
			if let Some(valid) = phonology::repair(&word) {
				return valid;
			}
		}

		phonology::fallback_word().to_owned()
	}

	/// Generates exactly `count` words.
	///
	/// Makes at most `count * 20` attempts, keeping results of at least
	/// 3 characters, and pads any shortfall with curated fallbacks, so
	/// the caller always gets `count` words without blocking.
	pub fn generate_words(&self, count: usize, max_length: usize) -> Vec<String> {
		let mut words = Vec::with_capacity(count);
		let mut attempts = 0;
		while words.len() < count && attempts < count * BATCH_ATTEMPT_FACTOR {
			let word = self.generate_word(max_length, None);
			if word.chars().count() >= MIN_KEPT_LEN {
				words.push(word);
			}
			attempts += 1;
		}
		while words.len() < count {
			words.push(phonology::fallback_word().to_owned());
		}
		words
	}

	/// Perplexity over held-out words, padded the same way as training.
	pub fn perplexity(&self, words: &[&str]) -> f64 {
		let padded: Vec<Vec<char>> = words
			.iter()
			.map(|word| {
				let mut sequence = vec![START_CHAR];
				sequence.extend(word.to_lowercase().chars());
				sequence.push(END_CHAR);
				sequence
			})
			.collect();
		self.model.perplexity(&padded)
	}

	/// Read-only statistics snapshot with the top `k` character n-grams.
	pub fn stats(&self, k: usize) -> ModelStats {
		ModelStats {
			vocab_size: self.model.vocab_size(),
			total_ngrams: self.model.total_ngrams(),
			unique_contexts: self.model.unique_contexts(),
			total_tokens: self.model.total_tokens(),
			most_common: self
				.model
				.top_ngrams(k)
				.into_iter()
				.map(|(context, token, count)| {
					(context.into_iter().chain(std::iter::once(token)).collect(), count)
				})
				.collect(),
		}
	}

	/// Merges another character model into this one.
	///
	/// # Errors
	/// Returns an error if the orders or smoothing policies differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		self.model.merge(&other.model)
	}

	/// Serializes the full count tables to `path` with postcard.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Reloads a model saved with [`CharModel::save`].
	///
	/// The reloaded model carries the exact training counts, so every
	/// probability matches the pre-save model bit for bit.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Loads a model from a text corpus, with a binary fast path.
	///
	/// If a sibling `.bin` file exists it is deserialized directly.
	/// Otherwise the corpus lines are cleaned, split into chunks (CPU
	/// count based), trained into partial models on worker threads,
	/// merged, and cached as `.bin` for the next run.
	pub fn from_corpus_file<P: AsRef<Path>>(
		filepath: P,
		n: usize,
		smoothing: Smoothing,
	) -> Result<Self, Box<dyn std::error::Error>> {
		let binary_path = build_output_path(&filepath, "bin")?;
		if binary_path.exists() {
			return Self::load(binary_path);
		}

		// Validates n before any thread is spawned
		let mut model = CharModel::new(n, smoothing)?;

		let lines = read_file(&filepath)?;
		let chunks = num_cpus::get() * 8;
		let chunk_size = lines.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		for chunk in lines.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();

			thread::spawn(move || {
				// n was validated above, so new() cannot fail here
				let mut partial = CharModel::new(n, smoothing).unwrap();
				for line in chunk {
					partial.train(&corpus::clean_line(&line));
				}
				tx.send(partial).expect("Failed to send from thread");
			});
		}
		drop(tx);

		for partial in rx.iter() {
			model.merge(&partial)?;
		}

		model.save(binary_path)?;
		Ok(model)
	}
}
