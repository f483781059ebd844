use thetha_core::chat::{Chatbot, GenerationMode};
use thetha_core::corpus;
use thetha_core::model::char_model::CharModel;
use thetha_core::model::smoothing::Smoothing;
use thetha_core::model::word_model::WordModel;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Character-level model: order 4 over ^word$ padded characters
    let mut char_model = CharModel::new(4, Smoothing::KneserNey)?;
    char_model.train(&corpus::char_corpus());

    // The same query under each smoothing policy
    for smoothing in [Smoothing::MaximumLikelihood, Smoothing::Laplace, Smoothing::KneserNey] {
        let mut model = CharModel::new(4, smoothing)?;
        model.train(&corpus::char_corpus());
        println!("P(i | \"^nd\") under {}: {:.4}", smoothing.as_str(), model.probability("^nd", 'i'));
    }

    // Generated words are phonologically repaired; if every attempt
    // fails, a curated fallback word comes back instead
    println!("\nGenerated words:");
    for word in char_model.generate_words(10, 12) {
        println!("  {}", word);
    }

    // Seeded generation continues a prefix
    println!("\nWords starting with 'ndi':");
    for _ in 0..3 {
        println!("  {}", char_model.generate_word(12, Some("ndi")));
    }

    // Statistics snapshot: vocabulary, counts and top n-grams
    let stats = char_model.stats(5);
    println!(
        "\nCharacter model: {} chars of vocabulary, {} unique contexts, {} n-grams, {} tokens",
        stats.vocab_size, stats.unique_contexts, stats.total_ngrams, stats.total_tokens
    );
    for (ngram, count) in &stats.most_common {
        println!("  {:?} seen {} times", ngram, count);
    }

    // Perplexity on held-out words (lower is better)
    println!(
        "\nPerplexity on held-out words: {:.2}",
        char_model.perplexity(&["ndiyabona", "umntwana"])
    );

    // Word-level model over the built-in phrase lists
    let mut word_model = WordModel::new(2, Smoothing::KneserNey)?;
    word_model.train(&corpus::word_corpus());
    println!("\nGenerated sentences:");
    for _ in 0..5 {
        println!("  {}", word_model.generate_sentence(10, None));
    }

    // Models round-trip through disk with their counts intact
    let path = std::env::temp_dir().join("thetha_demo_model.dat");
    char_model.save(&path)?;
    let reloaded = CharModel::load(&path)?;
    std::fs::remove_file(&path).ok();
    assert_eq!(
        char_model.probability("^nd", 'i').to_bits(),
        reloaded.probability("^nd", 'i').to_bits()
    );
    println!("\nSave/load round-trip preserved the probabilities");

    // The chatbot ties it all together
    let bot = Chatbot::new(3, GenerationMode::Word, Smoothing::KneserNey)?;
    println!("\nChat ({} words of vocabulary):", bot.vocab_size());
    for phrase in ["Molo", "Unjani", "Igama lakho ngubani"] {
        println!("  You: {}", phrase);
        println!("  Bot: {}", bot.respond(phrase));
    }

    Ok(())
}
