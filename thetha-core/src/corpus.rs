//! Built-in Xhosa training data and corpus cleanup.
//!
//! The hand-written word and phrase lists seed the chatbot when no
//! external corpus is available; [`clean_line`] normalizes lines of
//! external text dumps (wiki extracts) before they reach a model.

/// Greetings and short conversational openers.
pub const GREETINGS: &[&str] = &[
	"Molo", "Molo unjani", "Ninjani", "Molweni", "Unjani", "Ndiphilile",
	"Ndiyaphila", "Enkosi", "Wena unjani", "Kulungile", "Ewe", "Hayi",
	"Sawubona", "Hallo", "Lotjhani", "Avuxeni",
];

/// Everyday questions.
pub const QUESTIONS: &[&str] = &[
	"Uvela phi", "Uhlala phi", "Uyasebenza", "Ufunda phi", "Usapho lwakho ulungile",
	"Ixesha lantoni", "Kuyabanda", "Kushushu", "Uyathanda imidlalo", "Igama lakho ngubani",
	"Uyaxoka", "Uyayithanda imvula", "Uyadlala ibhola", "Uyasela itiye",
];

/// Typical answers to the questions above.
pub const RESPONSES: &[&str] = &[
	"Ndivela eKapa", "Ndivela eGoli", "Ndihlala eKapa", "Ewe ndiyasebenza",
	"Hayi andisebenzi", "Ndiyafunda eYunivesithi", "Ewe usapho luthi",
	"Ixesha li", "Ewe kuyabanda", "Hayi akubandanga", "Ewe kushushu",
	"NdinguThandi", "NdinguSipho", "NdinguZanele", "NginguBongani",
	"Andixoki", "Ewe ndiyayithanda imvula", "Hayi andiyithandi imvula",
	"Ewe ndiyayidlala ibhola", "Ewe ndiyasela itiye",
];

/// Scripted multi-turn conversations, one inner slice per exchange.
pub const CONVERSATIONS: &[&[&str]] = &[
	&["Molo", "Molo unjani", "Ndiphilile enkosi wena unjani", "Ndiyaphila enkosi"],
	&["Unjani", "Ndiyaphila enkosi wena unjani", "Ndiyaphila"],
	&["Igama lakho ngubani", "NginguThandi wena", "NginguSipho"],
	&["Uvela phi", "Ndivela eKapa wena uvela phi", "Ndivela eGoli"],
	&["Uyasebenza", "Ewe ndiyasebenza wena", "Hayi andisebenzi"],
	&["Ufunda phi", "Ndiyafunda eYunivesithi wena", "Andifundi"],
	&["Usapho lwakho ulungile", "Ewe usapho luthi enkosi"],
	&["Ixesha lantoni", "Ixesha li-3", "Enkosi"],
	&["Kuyabanda namhlanje", "Hayi akubandanga kakhulu"],
	&["Uyathanda imidlalo", "Ewe ndiyayithanda wena", "Hayi andiyithandi"],
	&["Sawubona", "Sawubona unjani", "Ngikhona wena", "Ngikhona"],
	&["Hallo", "Hallo unjani", "Ndiphilile wena", "Ndiyaphila"],
];

/// Morphological patterns for character-level training: noun-class
/// prefixes, suffixes, nasal and click clusters, CV syllables.
pub const CHARACTER_PATTERNS: &[&str] = &[
	// Noun-class prefixes
	"umu", "aba", "imi", "ama", "isi", "izi", "ubu", "uku", "ili",
	// Common suffixes
	"ntu", "ndo", "mbi", "nci", "nca", "nka", "nga", "nqa", "nta",
	"eni", "ini", "oni", "uni", "athi", "ethi", "ithi",
	"weni", "yeni", "kazi", "ana", "ele", "ile", "ise", "eka",
	// Common stems
	"ndi", "ngu", "pha", "tha", "sha", "nya", "mba",
	"ando", "endo", "indo", "ondo", "undo", "anga", "enga", "inga",
	// Nasal combinations
	"mba", "mbe", "mbi", "mbo", "mbu", "nda", "nde", "ndi", "ndo", "ndu",
	"nga", "nge", "ngi", "ngo", "ngu", "nka", "nke", "nki", "nko", "nku",
	"nqa", "nqe", "nqi", "nqo", "nqu", "nxa", "nxe", "nxi", "nxo", "nxu",
	"nca", "nce", "nci", "nco", "ncu", "nza", "nze", "nzi", "nzo", "nzu",
	// Click clusters
	"cwa", "cwe", "cwi", "cwo", "cwu", "xha", "xhe", "xhi", "xho", "xhu",
	"qha", "qhe", "qhi", "qho", "qhu", "gqa", "gqe", "gqi", "gqo", "gqu",
	// CV syllables
	"ma", "me", "mi", "mo", "mu", "na", "ne", "ni", "no", "nu",
	"pa", "pe", "pi", "po", "pu", "qa", "qe", "qi", "qo", "qu",
	"sa", "se", "si", "so", "su", "ta", "te", "ti", "to", "tu",
	"wa", "we", "wi", "wo", "wu", "ya", "ye", "yi", "yo", "yu",
	"za", "ze", "zi", "zo", "zu",
];

/// Common Xhosa words for character-level training.
pub const COMMON_WORDS: &[&str] = &[
	"mholo", "unjani", "ndiyaphila", "enkosi", "kakhulu", "igama",
	"thandi", "sipho", "nomsa", "vela", "ekapa", "egoli", "hlala",
	"sebenza", "funda", "sikolo", "sapho", "lulungile", "wamkelekile",
	"shiyeka", "hamba", "kakuhle", "thanda", "ntoni", "kulungile",
	"yazi", "thetha", "isingesi", "ndiya", "edolophini", "ukutya",
	"ixesha", "shushu", "imvula", "itiye", "ibhola", "iminyaka",
	"uzalwe", "nini", "meyi", "bazali", "bobabini", "bantwana",
	"babini", "bathathu", "babhadlile", "bathanda", "xhela", "mnike",
	"isipho", "fundisa", "khulisa", "imoto", "yakho", "yithenge",
	"nxiba", "yinxibe", "iimpahla", "ezintle", "zithengele", "zibize",
	"zithande", "zinxibe", "zihlambe", "zithengise", "zitshintshe",
	"zibhale", "zifunde", "ziyathetha", "ziyabona", "ziyacinga",
	"ziyafuna", "ziyakhonza", "ziqeqeshe", "zifundise", "zikhulule",
	"zivule", "zivale", "zibophe", "zisike", "zibambe", "uneminyaka",
	"ndineminyaka", "usapho", "unabazali", "unabantwana", "abantwana",
	"bafunda", "bayathanda", "ndiyamnika", "ndiyamfundisa",
	"ndiyayithanda", "ndiyayithenga", "ndiyazibhale", "ndiyathetha",
	"ndinomntwana", "ndinabantwana", "ndinemoto", "ndinesikolo",
	"ndinosapho", "ndinamandla", "ndinamanzi", "ndinesonka",
];

/// All phrase lists flattened into one whitespace-joined text.
pub fn training_text() -> String {
	word_corpus().join(" ")
}

/// Sentence list for word-level training: every phrase list plus every
/// conversation line.
pub fn word_corpus() -> Vec<String> {
	GREETINGS
		.iter()
		.chain(QUESTIONS)
		.chain(RESPONSES)
		.chain(CONVERSATIONS.iter().flat_map(|conversation| conversation.iter()))
		.map(|line| (*line).to_owned())
		.collect()
}

/// Flat text for character-level training: morphological patterns
/// followed by the common-word list.
pub fn char_corpus() -> String {
	let mut corpus = CHARACTER_PATTERNS.join(" ");
	corpus.push(' ');
	corpus.push_str(&COMMON_WORDS.join(" "));
	corpus
}

/// Removes one kind of delimited markup region, replacing it with a
/// space. An unterminated region swallows the rest of the line.
fn strip_delimited(text: &str, open: &str, close: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(start) = rest.find(open) {
		out.push_str(&rest[..start]);
		out.push(' ');
		match rest[start + open.len()..].find(close) {
			Some(end) => rest = &rest[start + open.len() + end + close.len()..],
			None => {
				rest = "";
				break;
			}
		}
	}
	out.push_str(rest);
	out
}

/// Cleans one line of an external text dump.
///
/// Strips wiki templates, links and XML-ish tags, keeps letters,
/// digits and basic punctuation, spaces the punctuation out for
/// tokenization, and normalizes whitespace.
pub fn clean_line(line: &str) -> String {
	let text = strip_delimited(line, "{{", "}}");
	let text = strip_delimited(&text, "[[", "]]");
	let text = strip_delimited(&text, "<", ">");

	let mut spaced = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'.' | ',' | '?' | '!' => {
				spaced.push(' ');
				spaced.push(c);
				spaced.push(' ');
			}
			c if c.is_alphanumeric() || c.is_whitespace() => spaced.push(c),
			_ => {}
		}
	}

	spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clean_line_strips_markup() {
		// Tags, templates and links go away; plain text between tags stays
		assert_eq!(
			clean_line("<ref>junk</ref> Molo {{template|x}} [[link]] unjani?"),
			"junk Molo unjani ?"
		);
	}

	#[test]
	fn clean_line_drops_unterminated_markup_tail() {
		assert_eq!(clean_line("Molo {{broken template"), "Molo");
	}

	#[test]
	fn clean_line_keeps_basic_punctuation_spaced() {
		assert_eq!(clean_line("Ewe, ndiyaphila!"), "Ewe , ndiyaphila !");
	}

	#[test]
	fn word_corpus_contains_every_list() {
		let corpus = word_corpus();
		assert!(corpus.iter().any(|line| line == "Molo"));
		assert!(corpus.iter().any(|line| line == "Uvela phi"));
		assert!(corpus.iter().any(|line| line == "Ndivela eKapa"));
		assert!(corpus.iter().any(|line| line == "Sawubona unjani"));
	}

	#[test]
	fn training_text_flattens_the_word_corpus() {
		let text = training_text();
		assert!(text.contains("Molo unjani"));
		let expected: usize = word_corpus()
			.iter()
			.map(|line| line.split_whitespace().count())
			.sum();
		assert_eq!(text.split_whitespace().count(), expected);
	}

	#[test]
	fn char_corpus_is_whitespace_separated_words() {
		let corpus = char_corpus();
		assert!(corpus.split_whitespace().count() >= CHARACTER_PATTERNS.len() + COMMON_WORDS.len());
		assert!(corpus.contains("ndiyaphila"));
	}
}
