use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed discount subtracted from raw counts by the back-off estimator.
pub(crate) const DISCOUNT: f64 = 0.75;

/// Probability estimation policy, selected once at model construction.
///
/// # Variants
/// - `MaximumLikelihood`: raw `count / total`; an unseen context yields 0.
/// - `Laplace`: additive smoothing `(count + 1) / (total + |vocab|)`;
///   every vocabulary token keeps a strictly positive probability.
/// - `KneserNey`: discounted back-off; mass removed from observed
///   continuations is redistributed through recursively shorter contexts,
///   down to global unigram frequencies. The right choice whenever
///   contexts are sparse relative to the vocabulary.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Smoothing {
	MaximumLikelihood,
	Laplace,
	#[default]
	KneserNey,
}

impl Smoothing {
	/// Stable name used by the HTTP and UI surfaces.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::MaximumLikelihood => "mle",
			Self::Laplace => "laplace",
			Self::KneserNey => "kneser_ney",
		}
	}
}

impl FromStr for Smoothing {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_ascii_lowercase().as_str() {
			"mle" | "maximum_likelihood" => Ok(Self::MaximumLikelihood),
			"laplace" => Ok(Self::Laplace),
			"kneser_ney" | "kneser-ney" => Ok(Self::KneserNey),
			other => Err(format!("Unknown smoothing '{}', expected mle, laplace or kneser_ney", other)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_known_names() {
		assert_eq!("mle".parse::<Smoothing>(), Ok(Smoothing::MaximumLikelihood));
		assert_eq!("Laplace".parse::<Smoothing>(), Ok(Smoothing::Laplace));
		assert_eq!("kneser_ney".parse::<Smoothing>(), Ok(Smoothing::KneserNey));
		assert!("good-turing".parse::<Smoothing>().is_err());
	}

	#[test]
	fn round_trips_through_as_str() {
		for smoothing in [Smoothing::MaximumLikelihood, Smoothing::Laplace, Smoothing::KneserNey] {
			assert_eq!(smoothing.as_str().parse::<Smoothing>(), Ok(smoothing));
		}
	}
}
