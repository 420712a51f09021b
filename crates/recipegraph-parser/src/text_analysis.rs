use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("text analyzer '{0}' has not been started")]
    NotStarted(String),

    #[error("failed to compile pattern: {0}")]
    Pattern(String),
}

/// A cooking verb found in recipe text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbMention {
    /// Surface form as written
    pub verb: String,
    /// Base form from the lexicon
    pub lemma: String,
    pub sentence: String,
    pub sentence_index: usize,
    /// Byte offset of the verb inside `sentence`
    pub position: usize,
}

/// Sentence segmentation and verb detection capability.
///
/// Implementations own whatever heavy state they need and are injected into
/// the components that use them; nothing here is process-global.
pub trait TextAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    /// Split text into trimmed, non-empty sentences in source order.
    fn segment(&self, text: &str) -> Result<Vec<String>, AnalyzerError>;

    /// Cooking verbs per sentence, indexed like [`TextAnalyzer::segment`].
    fn cooking_verbs(&self, text: &str) -> Result<Vec<VerbMention>, AnalyzerError>;
}

const COOKING_VERBS: &[&str] = &[
    "add", "arrange", "bake", "baste", "beat", "blanch", "blend", "boil", "braise", "bring",
    "broil", "brown", "brush", "chill", "chop", "coat", "combine", "cook", "cool", "cover",
    "cream", "crush", "cut", "deglaze", "dice", "dissolve", "drain", "drizzle", "dust", "flip",
    "fold", "fry", "garnish", "glaze", "grate", "grease", "grill", "grind", "heat", "julienne",
    "knead", "layer", "marinate", "mash", "measure", "melt", "microwave", "mince", "mix",
    "peel", "poach", "pour", "preheat", "press", "puree", "reduce", "refrigerate", "remove",
    "rinse", "roast", "roll", "rub", "sauté", "saute", "scald", "scoop", "sear", "season",
    "serve", "shake", "shred", "sift", "simmer", "slice", "soak", "spread", "sprinkle",
    "steam", "stir", "strain", "stuff", "toast", "toss", "transfer", "whip", "whisk",
];

/// Period-terminated words that usually do not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "approx", "c", "ca", "doz", "e.g", "env", "fl", "g", "gal", "hr", "hrs", "i.e", "kg",
    "lb", "lbs", "min", "mins", "ml", "no", "oz", "pkg", "pt", "qt", "sec", "tbs", "tbsp",
    "tsp", "vs",
];

struct Patterns {
    list_item: Regex,
    word: Regex,
    fused_temperature: Regex,
    bare_unit: Regex,
    temperature_lead: Regex,
    verbs: HashSet<&'static str>,
    abbreviations: HashSet<&'static str>,
}

impl Patterns {
    fn compile() -> Result<Self, AnalyzerError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| AnalyzerError::Pattern(e.to_string()))
        };

        Ok(Self {
            list_item: compile(r"^(?:\d+[.)]|[-*•])\s+")?,
            word: compile(r"\p{L}+")?,
            fused_temperature: compile(r"^\d+(?:[.,]\d+)?\s*°?[FC]$")?,
            bare_unit: compile(r"^°?[FC]$")?,
            temperature_lead: compile(r"(?i)^(?:\d+(?:[.,]\d+)?°?|°|degrees?)$")?,
            verbs: COOKING_VERBS.iter().copied().collect(),
            abbreviations: ABBREVIATIONS.iter().copied().collect(),
        })
    }
}

/// Rule-based analyzer: line-structure aware sentence splitting plus a
/// cooking-verb lexicon with suffix stripping.
///
/// Must be [`start`](RuleBasedAnalyzer::start)ed before use.
pub struct RuleBasedAnalyzer {
    patterns: RwLock<Option<Patterns>>,
}

impl Default for RuleBasedAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedAnalyzer {
    pub fn new() -> Self {
        Self {
            patterns: RwLock::new(None),
        }
    }

    /// Construct and start in one step.
    pub fn started() -> Result<Self, AnalyzerError> {
        let analyzer = Self::new();
        analyzer.start()?;
        Ok(analyzer)
    }

    pub fn start(&self) -> Result<(), AnalyzerError> {
        let mut guard = self.patterns.write();
        if guard.is_none() {
            *guard = Some(Patterns::compile()?);
            info!("Text analyzer '{}' started", self.name());
        }
        Ok(())
    }

    pub fn shutdown(&self) {
        if self.patterns.write().take().is_some() {
            info!("Text analyzer '{}' shut down", self.name());
        }
    }

    pub fn is_running(&self) -> bool {
        self.patterns.read().is_some()
    }

    fn with_patterns<T>(&self, f: impl FnOnce(&Patterns) -> T) -> Result<T, AnalyzerError> {
        let guard = self.patterns.read();
        match guard.as_ref() {
            Some(patterns) => Ok(f(patterns)),
            None => Err(AnalyzerError::NotStarted(self.name().to_string())),
        }
    }
}

impl TextAnalyzer for RuleBasedAnalyzer {
    fn name(&self) -> &str {
        "rule-based"
    }

    fn segment(&self, text: &str) -> Result<Vec<String>, AnalyzerError> {
        self.with_patterns(|patterns| {
            blocks(patterns, text)
                .iter()
                .flat_map(|block| split_block(patterns, block))
                .collect()
        })
    }

    fn cooking_verbs(&self, text: &str) -> Result<Vec<VerbMention>, AnalyzerError> {
        let sentences = self.segment(text)?;
        self.with_patterns(|patterns| {
            let mut mentions = Vec::new();
            for (sentence_index, sentence) in sentences.iter().enumerate() {
                for word in patterns.word.find_iter(sentence) {
                    if let Some(lemma) = lemmatize(patterns, word.as_str()) {
                        mentions.push(VerbMention {
                            verb: word.as_str().to_string(),
                            lemma: lemma.to_string(),
                            sentence: sentence.clone(),
                            sentence_index,
                            position: word.start(),
                        });
                    }
                }
            }
            debug!("Found {} cooking verb mentions", mentions.len());
            mentions
        })
    }
}

/// Group lines into blocks. Blank lines, headings and list items start a
/// new block; other lines continue the current one.
fn blocks(patterns: &Patterns, text: &str) -> Vec<String> {
    fn flush(current: &mut String, blocks: &mut Vec<String>) {
        if !current.is_empty() {
            blocks.push(std::mem::take(current));
        }
    }

    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut current, &mut blocks);
            continue;
        }
        if line.starts_with('#') {
            flush(&mut current, &mut blocks);
            blocks.push(line.to_string());
            continue;
        }
        if patterns.list_item.is_match(line) {
            flush(&mut current, &mut blocks);
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(line);
    }
    flush(&mut current, &mut blocks);

    blocks
}

fn is_closing(ch: char) -> bool {
    matches!(ch, '"' | '\'' | ')' | ']' | '”' | '’')
}

fn split_block(patterns: &Patterns, block: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = block.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        if !matches!(ch, '.' | '!' | '?') {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && is_closing(chars[j].1) {
            j += 1;
        }
        let end = chars.get(j).map(|(offset, _)| *offset).unwrap_or(block.len());
        let at_boundary = j >= chars.len() || chars[j].1.is_whitespace();

        if at_boundary && (ch != '.' || period_ends_sentence(patterns, block, start, pos, end)) {
            push_sentence(&mut sentences, &block[start..end]);
            start = end;
        }
        i = j;
    }
    push_sentence(&mut sentences, &block[start..]);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() {
        sentences.push(candidate.to_string());
    }
}

fn period_ends_sentence(
    patterns: &Patterns,
    block: &str,
    sentence_start: usize,
    period: usize,
    end: usize,
) -> bool {
    let before: Vec<&str> = block[sentence_start..period].split_whitespace().collect();
    let Some(last) = before.last() else {
        return true;
    };
    let word = last.trim_start_matches(['(', '"', '\'']);
    let previous = before.len().checked_sub(2).map(|i| before[i]);

    if is_temperature(patterns, word, previous) {
        return true;
    }

    // "1." opening a list item
    if sentence_start == 0 && before.len() == 1 && word.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let next = block[end..].trim_start().chars().next();
    let next_continues = next.map_or(false, |c| c.is_lowercase() || c.is_ascii_digit());

    let mut letters = word.chars();
    if let (Some(only), None) = (letters.next(), letters.next()) {
        if only.is_uppercase() && is_initial(previous) {
            return false;
        }
        if only.is_alphabetic() {
            return !next_continues;
        }
    }

    if patterns.abbreviations.contains(word.to_lowercase().as_str()) {
        return !next_continues;
    }

    true
}

/// Words after which a lone capital reads as a name initial.
const NAME_LEADS: &[&str] = &["by", "from", "chef", "and"];

/// `J.` in "by J. Smith" or "J. R. Smith", but not `C.` in "vitamin C.".
fn is_initial(previous: Option<&str>) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    let previous = previous.trim_start_matches(['(', '"', '\'']);
    previous.chars().next().map_or(true, char::is_uppercase)
        || NAME_LEADS.contains(&previous.to_lowercase().as_str())
}

/// `350F`, `350°F`, `180 °C`, `350 F`, `350 degrees F`.
fn is_temperature(patterns: &Patterns, word: &str, previous: Option<&str>) -> bool {
    if patterns.fused_temperature.is_match(word) {
        return true;
    }
    if patterns.bare_unit.is_match(word) {
        return previous.map_or(false, |p| patterns.temperature_lead.is_match(p));
    }
    false
}

fn lemmatize(patterns: &Patterns, word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    inflection_candidates(&lower)
        .into_iter()
        .find_map(|candidate| patterns.verbs.get(candidate.as_str()).copied())
}

fn inflection_candidates(word: &str) -> Vec<String> {
    let mut candidates = vec![word.to_string()];
    for suffix in ["ing", "ed", "es", "s", "d"] {
        let Some(stem) = word.strip_suffix(suffix) else {
            continue;
        };
        if stem.chars().count() < 2 {
            continue;
        }
        candidates.push(stem.to_string());
        candidates.push(format!("{stem}e"));

        let chars: Vec<char> = stem.chars().collect();
        let n = chars.len();
        if n >= 3 && chars[n - 1] == chars[n - 2] {
            candidates.push(chars[..n - 1].iter().collect());
        }
    }
    candidates
}
