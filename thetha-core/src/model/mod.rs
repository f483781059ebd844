//! Top-level module for the n-gram language modelling system.
//!
//! Provides the statistical core of the generator:
//! - A generic counting/smoothing/sampling model (`NGramModel`)
//! - A character-level word generator (`CharModel`)
//! - A word-level sentence generator (`WordModel`)
//! - Smoothing policy selection (`Smoothing`)
//! - Internal per-context frequency tables (`State`)
//! - Phonological validity filtering for generated words

/// Generic n-gram model: counting, smoothed probability estimation,
/// weighted sampling, statistics and perplexity.
pub mod ngram_model;

/// Character-level model generating phonologically plausible words,
/// with retry/fallback guarantees.
pub mod char_model;

/// Word-level model generating sentences, with Xhosa-aware
/// tokenization and light morphological segmentation.
pub mod word_model;

/// Probability smoothing policies (MLE, Laplace, discounted back-off).
pub mod smoothing;

/// Internal frequency table for one context.
///
/// Tracks continuation counts with a cached total. Not exposed publicly.
mod state;

/// Internal phonological constraints and the curated fallback words.
mod phonology;
