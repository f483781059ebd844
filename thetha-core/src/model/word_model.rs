use std::path::Path;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use super::ngram_model::{ModelStats, NGramModel};
use super::smoothing::Smoothing;
use crate::corpus;
use crate::io::{build_output_path, read_file};

/// Marker padded n-1 times before every training sentence.
pub const START_TOKEN: &str = "<s>";
/// Marker appended to every training sentence; sampling it ends one.
pub const END_TOKEN: &str = "</s>";

/// Common Xhosa noun-class prefixes used for morphological segmentation.
const PREFIXES: [&str; 9] = ["umu", "aba", "imi", "ama", "isi", "izi", "ubu", "uku", "ili"];
/// Common Xhosa suffixes used for morphological segmentation.
const SUFFIXES: [&str; 7] = ["eni", "ini", "oni", "weni", "yeni", "kazi", "ana"];
/// Tokens longer than this are likely agglutinated and get segmented.
const SEGMENT_THRESHOLD: usize = 8;

/// Word-level n-gram model generating Xhosa sentences.
///
/// The structural twin of [`super::char_model::CharModel`] at word
/// granularity: same count tables and smoothing, different
/// tokenization (whitespace words with light morphological
/// segmentation) and different boundary handling (n-1 start markers).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WordModel {
	model: NGramModel<String>,
}

impl WordModel {
	/// Creates an untrained word model of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize, smoothing: Smoothing) -> Result<Self, String> {
		Ok(Self {
			model: NGramModel::new(n, smoothing)?,
		})
	}

	/// Returns the order of the model.
	pub fn n(&self) -> usize {
		self.model.n()
	}

	/// Tokenizes a sentence for training or seeding.
	///
	/// Lowercases, strips everything but letters, digits and
	/// whitespace, splits on whitespace, and segments long tokens on
	/// known prefixes/suffixes.
	pub fn preprocess(text: &str) -> Vec<String> {
		let cleaned: String = text
			.to_lowercase()
			.chars()
			.filter(|c| c.is_alphanumeric() || c.is_whitespace())
			.collect();

		let mut tokens = Vec::new();
		for token in cleaned.split_whitespace() {
			if token.chars().count() > SEGMENT_THRESHOLD {
				tokens.extend(Self::segment(token));
			} else {
				tokens.push(token.to_owned());
			}
		}
		tokens
	}

	/// Splits an agglutinated word on the first matching noun-class
	/// prefix, then on the first matching suffix of the remainder.
	fn segment(word: &str) -> Vec<String> {
		let mut segments = Vec::new();
		let mut rest = word;

		for prefix in PREFIXES {
			if let Some(stripped) = rest.strip_prefix(prefix) {
				if stripped.chars().count() > 2 {
					segments.push(prefix.to_owned());
					rest = stripped;
					break;
				}
			}
		}

		for suffix in SUFFIXES {
			if let Some(stem) = rest.strip_suffix(suffix) {
				if stem.chars().count() > 2 {
					segments.push(stem.to_owned());
					segments.push(suffix.to_owned());
					return segments;
				}
			}
		}

		segments.push(rest.to_owned());
		segments
	}

	/// Trains on a batch of sentences.
	///
	/// Rows of the form `input|response` are split and each part
	/// trained separately (conversation transcripts).
	pub fn train<S: AsRef<str>>(&mut self, sentences: &[S]) {
		for sentence in sentences {
			for part in sentence.as_ref().split('|') {
				self.train_sentence(part.trim());
			}
		}
	}

	/// Trains on one sentence; too-short sentences are silently skipped.
	pub fn train_sentence(&mut self, sentence: &str) {
		let tokens = Self::preprocess(sentence);
		if tokens.len() < self.model.n() {
			return;
		}

		let n = self.model.n();
		let mut padded = vec![START_TOKEN.to_owned(); n - 1];
		padded.extend(tokens);
		padded.push(END_TOKEN.to_owned());
		self.model.add_sequence(&padded);
	}

	/// Estimates `P(word | context)` under the configured smoothing.
	pub fn probability(&self, context: &[&str], word: &str) -> f64 {
		let context: Vec<String> = context.iter().map(|w| (*w).to_owned()).collect();
		self.model.probability(&context, &word.to_owned())
	}

	/// Generates a sentence of at most `max_length` words.
	///
	/// An optional seed is preprocessed like training input and used as
	/// the starting context. The sampled words are joined with spaces,
	/// capitalized, and closed with a period. An empty generation
	/// yields an empty string (callers decide how to degrade).
	pub fn generate_sentence(&self, max_length: usize, seed: Option<&str>) -> String {
		let seed_tokens = seed.map(Self::preprocess);
		let start = START_TOKEN.to_owned();
		let end = END_TOKEN.to_owned();

		let words = self
			.model
			.generate(max_length, seed_tokens.as_deref(), &start, &end);
		Self::post_process(&words.join(" "))
	}

	/// Capitalizes the first letter and appends a final period.
	fn post_process(sentence: &str) -> String {
		let mut chars = sentence.chars();
		let Some(first) = chars.next() else {
			return String::new();
		};

		let mut out: String = first.to_uppercase().chain(chars).collect();
		if !out.ends_with(['.', '!', '?']) {
			out.push('.');
		}
		out
	}

	/// Perplexity over held-out sentences, padded like training input.
	pub fn perplexity(&self, sentences: &[&str]) -> f64 {
		let n = self.model.n();
		let padded: Vec<Vec<String>> = sentences
			.iter()
			.map(|sentence| {
				let tokens = Self::preprocess(sentence);
				let mut sequence = vec![START_TOKEN.to_owned(); n - 1];
				sequence.extend(tokens);
				sequence.push(END_TOKEN.to_owned());
				sequence
			})
			.collect();
		self.model.perplexity(&padded)
	}

	/// Read-only statistics snapshot with the top `k` word n-grams.
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
				.map(|(mut context, token, count)| {
					context.push(token);
					(context.join(" "), count)
				})
				.collect(),
		}
	}

	/// Merges another word model into this one.
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

	/// Reloads a model saved with [`WordModel::save`], counts intact.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	/// Loads a model from a sentence-per-line corpus, with the same
	/// binary fast path and chunked build as the character variant.
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
		let mut model = WordModel::new(n, smoothing)?;

		let lines = read_file(&filepath)?;
		let chunks = num_cpus::get() * 8;
		let chunk_size = lines.len().div_ceil(chunks).max(1);

		let (tx, rx) = mpsc::channel();
		for chunk in lines.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();

			thread::spawn(move || {
				// n was validated above, so new() cannot fail here
				let mut partial = WordModel::new(n, smoothing).unwrap();
				for line in &chunk {
					partial.train(&[corpus::clean_line(line)]);
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

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bigram_with_single_continuation_is_deterministic() {
		let mut model = WordModel::new(2, Smoothing::MaximumLikelihood).unwrap();
		model.train_sentence("molo unjani");
		// The only continuation of "molo" is "unjani"; the end marker
		// is unreachable from that context under MLE.
		for _ in 0..10 {
			assert_eq!(model.generate_sentence(1, Some("molo")), "Unjani.");
		}
	}

	#[test]
	fn preprocess_strips_punctuation_and_lowercases() {
		assert_eq!(
			WordModel::preprocess("Molo, unjani?!"),
			vec!["molo".to_owned(), "unjani".to_owned()]
		);
	}

	#[test]
	fn preprocess_segments_long_agglutinated_tokens() {
		// "ukuhambisa" starts with the "uku" prefix
		assert_eq!(
			WordModel::preprocess("ukuhambisa"),
			vec!["uku".to_owned(), "hambisa".to_owned()]
		);
		// Short tokens stay whole
		assert_eq!(WordModel::preprocess("ukuhamba"), vec!["ukuhamba".to_owned()]);
	}

	#[test]
	fn segment_splits_suffixes_off_long_stems() {
		// "eni" is tried before "weni", so the stem keeps the 'w'
		assert_eq!(
			WordModel::segment("sikolweni"),
			vec!["sikolw".to_owned(), "eni".to_owned()]
		);
	}

	#[test]
	fn conversation_rows_train_both_sides() {
		let mut model = WordModel::new(2, Smoothing::MaximumLikelihood).unwrap();
		model.train(&["molo unjani|ndiyaphila enkosi"]);
		assert!(model.probability(&["molo"], "unjani") > 0.0);
		assert!(model.probability(&["ndiyaphila"], "enkosi") > 0.0);
	}

	#[test]
	fn too_short_sentences_are_skipped() {
		let mut model = WordModel::new(3, Smoothing::MaximumLikelihood).unwrap();
		model.train_sentence("molo unjani");
		assert_eq!(model.stats(0).total_tokens, 0);
	}

	#[test]
	fn post_process_capitalizes_and_terminates() {
		assert_eq!(WordModel::post_process("molo unjani"), "Molo unjani.");
		assert_eq!(WordModel::post_process(""), "");
	}

	#[test]
	fn sentence_generation_respects_length_bound() {
		let mut model = WordModel::new(2, Smoothing::KneserNey).unwrap();
		model.train(&["molo unjani ndiyaphila", "unjani wena", "ndiyaphila enkosi kakhulu"]);
		for _ in 0..10 {
			let sentence = model.generate_sentence(4, None);
			let words = sentence.split_whitespace().count();
			assert!(words <= 4);
		}
	}
}
