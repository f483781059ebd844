use rand::prelude::IndexedRandom;

/// Curated fallback words returned when generation exhausts its retry
/// budget. The public contract never returns empty output.
pub(crate) const FALLBACK_WORDS: [&str; 10] = [
	"mholo", "unjani", "ndiyaphila", "enkosi", "kakuhle",
	"sawubona", "ngiyaphila", "ngiyabonga", "hamba", "yah",
];

/// Maximum run of consecutive vowels a repaired word may keep.
const MAX_VOWEL_RUN: usize = 3;
/// Maximum run of consecutive consonants a repaired word may keep.
const MAX_CONSONANT_RUN: usize = 2;

fn is_vowel(c: char) -> bool {
	matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn is_consonant(c: char) -> bool {
	c.is_ascii_alphabetic() && !is_vowel(c)
}

/// Picks one of the curated fallback words.
pub(crate) fn fallback_word() -> &'static str {
	// The slice is non-empty, so choose never returns None
	FALLBACK_WORDS.choose(&mut rand::rng()).copied().unwrap_or(FALLBACK_WORDS[0])
}

/// Applies Xhosa phonological constraints to a generated word.
///
/// Repairs rather than rejects where possible:
/// - a leading doubled consonant ("bb", "nn", ...) loses its first
///   character, repeatedly, bounded by the word length;
/// - runs longer than 3 vowels or 2 consonants are capped by dropping
///   the offending characters in place.
///
/// Returns `None` when fewer than 2 characters survive.
pub(crate) fn repair(word: &str) -> Option<String> {
	let mut chars: Vec<char> = word.chars().collect();

	// Words never start on a doubled consonant
	while chars.len() >= 2 && chars[0] == chars[1] && is_consonant(chars[0]) {
		chars.remove(0);
	}

	let mut vowel_run = 0;
	let mut consonant_run = 0;
	let mut repaired = String::new();
	for c in chars {
		if is_vowel(c) {
			vowel_run += 1;
			consonant_run = 0;
		} else if is_consonant(c) {
			consonant_run += 1;
			vowel_run = 0;
		}
		if vowel_run <= MAX_VOWEL_RUN && consonant_run <= MAX_CONSONANT_RUN {
			repaired.push(c);
		}
	}

	if repaired.chars().count() >= 2 {
		Some(repaired)
	} else {
		None
	}
}
