use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::corpus;
use crate::model::char_model::CharModel;
use crate::model::ngram_model::ModelStats;
use crate::model::smoothing::Smoothing;
use crate::model::word_model::WordModel;

/// Default response length, in tokens of the active granularity.
const RESPONSE_LENGTH: usize = 15;

/// Granularity of the conversational model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GenerationMode {
	#[default]
	Word,
	Character,
}

impl GenerationMode {
	/// Stable name used by the HTTP and UI surfaces.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Word => "word",
			Self::Character => "character",
		}
	}
}

impl FromStr for GenerationMode {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_ascii_lowercase().as_str() {
			"word" => Ok(Self::Word),
			"character" | "char" => Ok(Self::Character),
			other => Err(format!("Unknown mode '{}', expected word or character", other)),
		}
	}
}

enum ChatModel {
	Word(WordModel),
	Character(CharModel),
}

/// Conversational wrapper around one trained model.
///
/// Construction trains the selected variant on the built-in corpus;
/// after that the chatbot is read-only, so concurrent `respond` calls
/// behind a shared reference are safe. Changing settings means
/// building a new chatbot — models are never retrained in place.
pub struct Chatbot {
	n: usize,
	mode: GenerationMode,
	smoothing: Smoothing,
	model: ChatModel,
}

impl Chatbot {
	/// Builds a chatbot of order `n` and trains it on the built-in
	/// Xhosa corpus.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize, mode: GenerationMode, smoothing: Smoothing) -> Result<Self, String> {
		let model = match mode {
			GenerationMode::Word => {
				let mut model = WordModel::new(n, smoothing)?;
				model.train(&corpus::word_corpus());
				ChatModel::Word(model)
			}
			GenerationMode::Character => {
				let mut model = CharModel::new(n, smoothing)?;
				model.train(&corpus::char_corpus());
				ChatModel::Character(model)
			}
		};
		Ok(Self { n, mode, smoothing, model })
	}

	/// Returns the n-gram order.
	pub fn n(&self) -> usize {
		self.n
	}

	/// Returns the generation granularity.
	pub fn mode(&self) -> GenerationMode {
		self.mode
	}

	/// Returns the smoothing policy.
	pub fn smoothing(&self) -> Smoothing {
		self.smoothing
	}

	/// Generates a reply to `input`.
	///
	/// Empty input yields a short random greeting; otherwise the last
	/// n-1 words (or characters) of the input seed the generation.
	/// Never returns empty output in character mode; word mode may
	/// produce an empty sentence, which callers display as-is.
	pub fn respond(&self, input: &str) -> String {
		let input = input.trim();
		if input.is_empty() {
			let length = rand::rng().random_range(5..=10);
			return self.generate(length, None);
		}

		let context = match self.mode {
			GenerationMode::Word => {
				let words: Vec<&str> = input.split_whitespace().collect();
				let start = words.len().saturating_sub(self.n - 1);
				words[start..].join(" ")
			}
			GenerationMode::Character => {
				let chars: Vec<char> = input.chars().collect();
				let start = chars.len().saturating_sub(self.n - 1);
				chars[start..].iter().collect()
			}
		};
		self.generate(RESPONSE_LENGTH, Some(&context))
	}

	/// Generates sample output of `length` tokens, optionally seeded
	/// with `prompt`.
	pub fn generate_sample(&self, prompt: Option<&str>, length: usize) -> String {
		let prompt = prompt.filter(|p| !p.trim().is_empty());
		self.generate(length, prompt)
	}

	/// Generates `count` independent outputs for batch requests.
	///
	/// Character mode without a seed delegates to the batch word
	/// generator (exact count, fallback-padded); everything else loops
	/// over single generations.
	pub fn generate_batch(&self, count: usize, max_length: usize, seed: Option<&str>) -> Vec<String> {
		match (&self.model, seed) {
			(ChatModel::Character(model), None) => model.generate_words(count, max_length),
			(ChatModel::Character(model), Some(seed)) => (0..count)
				.map(|_| model.generate_word(max_length, Some(seed)))
				.collect(),
			(ChatModel::Word(model), seed) => (0..count)
				.map(|_| model.generate_sentence(max_length, seed))
				.collect(),
		}
	}

	fn generate(&self, length: usize, seed: Option<&str>) -> String {
		match &self.model {
			ChatModel::Word(model) => model.generate_sentence(length, seed),
			ChatModel::Character(model) => model.generate_word(length, seed),
		}
	}

	/// Vocabulary size of the underlying model.
	pub fn vocab_size(&self) -> usize {
		self.stats(0).vocab_size
	}

	/// Statistics snapshot of the underlying model.
	pub fn stats(&self, k: usize) -> ModelStats {
		match &self.model {
			ChatModel::Word(model) => model.stats(k),
			ChatModel::Character(model) => model.stats(k),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mode_parses_from_surface_names() {
		assert_eq!("word".parse::<GenerationMode>(), Ok(GenerationMode::Word));
		assert_eq!("char".parse::<GenerationMode>(), Ok(GenerationMode::Character));
		assert_eq!("Character".parse::<GenerationMode>(), Ok(GenerationMode::Character));
		assert!("sentence".parse::<GenerationMode>().is_err());
	}

	#[test]
	fn character_chatbot_never_replies_empty() {
		let bot = Chatbot::new(3, GenerationMode::Character, Smoothing::KneserNey).unwrap();
		for input in ["", "molo", "unjani wena"] {
			assert!(!bot.respond(input).is_empty());
		}
	}

	#[test]
	fn word_chatbot_trains_on_builtin_corpus() {
		let bot = Chatbot::new(2, GenerationMode::Word, Smoothing::KneserNey).unwrap();
		assert!(bot.vocab_size() > 0);
	}

	#[test]
	fn batch_generation_returns_requested_count() {
		let bot = Chatbot::new(3, GenerationMode::Character, Smoothing::KneserNey).unwrap();
		assert_eq!(bot.generate_batch(5, 12, None).len(), 5);
		let seeded = bot.generate_batch(3, 12, Some("nd"));
		assert_eq!(seeded.len(), 3);
	}

	#[test]
	fn sample_generation_treats_blank_prompts_as_absent() {
		let bot = Chatbot::new(3, GenerationMode::Character, Smoothing::KneserNey).unwrap();
		// Whitespace-only prompts take the unseeded path instead of
		// seeding with an empty context
		assert!(!bot.generate_sample(Some("   "), 12).is_empty());
		assert!(!bot.generate_sample(None, 12).is_empty());
	}

	#[test]
	fn sample_generation_continues_a_prompt() {
		let bot = Chatbot::new(3, GenerationMode::Character, Smoothing::KneserNey).unwrap();
		for _ in 0..5 {
			assert!(!bot.generate_sample(Some("nd"), 12).is_empty());
		}
	}

	#[test]
	fn invalid_order_fails_at_construction() {
		assert!(Chatbot::new(0, GenerationMode::Word, Smoothing::KneserNey).is_err());
	}
}
