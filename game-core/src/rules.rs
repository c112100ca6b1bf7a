use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_MIN_WORD_LENGTH: usize = 4;

const VOWELS: &str = "aeiou";
const CONSONANTS: &str = "bcdfghjklmnpqrstvwxyz";

/// A word rule with its parameters.
///
/// Rules are plain data so the active rule survives a store round trip and
/// can be evaluated again without regenerating the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    MinLength { min_length: usize },
    ContainsLetter { letter: char, min_length: usize },
    ExcludesLetter { letter: char, min_length: usize },
    StartsWithLetter { letter: char, min_length: usize },
    EndsWithLetter { letter: char, min_length: usize },
    EndsWith { suffix: String, min_length: usize },
    StartsWith { prefix: String, min_length: usize },
    DoubleLetterPairs { pairs: usize, min_length: usize },
    ExactLength { length: usize },
    ConsonantBoundaries { min_length: usize },
    VowelBoundaries { min_length: usize },
    LetterExactlyThrice { min_length: usize },
    Palindrome { min_length: usize },
    NoRepeatedLetters { min_length: usize },
    VowelConsonantCount { vowels: usize, consonants: usize, min_length: usize },
    SameLetterThrice { min_length: usize },
    BalancedVowels { min_length: usize },
}

impl Rule {
    /// Check a lowercase word against this rule.
    ///
    /// The room-wide minimum length is checked separately before any rule is
    /// consulted, so only [`Rule::MinLength`] and [`Rule::ExactLength`] look at
    /// length here.
    pub fn matches(&self, word: &str) -> bool {
        match self {
            Rule::MinLength { min_length } => word.chars().count() >= *min_length,
            Rule::ContainsLetter { letter, .. } => word.contains(*letter),
            Rule::ExcludesLetter { letter, .. } => !word.contains(*letter),
            Rule::StartsWithLetter { letter, .. } => word.starts_with(*letter),
            Rule::EndsWithLetter { letter, .. } => word.ends_with(*letter),
            Rule::EndsWith { suffix, .. } => word.ends_with(suffix.as_str()),
            Rule::StartsWith { prefix, .. } => word.starts_with(prefix.as_str()),
            Rule::DoubleLetterPairs { pairs, .. } => double_letter_pairs(word) >= *pairs,
            Rule::ExactLength { length } => word.chars().count() == *length,
            Rule::ConsonantBoundaries { .. } => bounded_by(word, CONSONANTS),
            Rule::VowelBoundaries { .. } => bounded_by(word, VOWELS),
            Rule::LetterExactlyThrice { .. } | Rule::SameLetterThrice { .. } => {
                letter_counts(word).values().any(|&count| count == 3)
            }
            Rule::Palindrome { .. } => word.chars().eq(word.chars().rev()),
            Rule::NoRepeatedLetters { .. } => {
                letter_counts(word).len() == word.chars().count()
            }
            Rule::VowelConsonantCount {
                vowels, consonants, ..
            } => count_in(word, VOWELS) == *vowels && count_in(word, CONSONANTS) == *consonants,
            Rule::BalancedVowels { .. } => count_in(word, VOWELS) == count_in(word, CONSONANTS),
        }
    }

    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::MinLength { min_length } => {
                write!(f, "Word must be at least {} characters!", min_length)
            }
            Rule::ContainsLetter { letter, min_length } => write!(
                f,
                "Word must contain the letter '{}' and be at least {} characters long",
                letter, min_length
            ),
            Rule::ExcludesLetter { letter, min_length } => write!(
                f,
                "Word must NOT contain the letter '{}' and be at least {} characters long",
                letter, min_length
            ),
            Rule::StartsWithLetter { letter, min_length } => write!(
                f,
                "Word must start with the letter '{}' and be at least {} characters long",
                letter, min_length
            ),
            Rule::EndsWithLetter { letter, min_length } => write!(
                f,
                "Word must end with the letter '{}' and be at least {} characters long",
                letter, min_length
            ),
            Rule::EndsWith { suffix, min_length } => write!(
                f,
                "Word must end with '{}' and be at least {} characters long",
                suffix, min_length
            ),
            Rule::StartsWith { prefix, min_length } => write!(
                f,
                "Word must start with '{}' and be at least {} characters long",
                prefix, min_length
            ),
            Rule::DoubleLetterPairs { pairs, min_length } => write!(
                f,
                "Word must contain at least {} pairs of double letters and be at least {} characters long",
                number_word(*pairs),
                min_length
            ),
            Rule::ExactLength { length } => {
                write!(f, "Word must have exactly {} letters", length)
            }
            Rule::ConsonantBoundaries { min_length } => write!(
                f,
                "Word must start and end with a consonant and be at least {} characters long",
                min_length
            ),
            Rule::VowelBoundaries { min_length } => write!(
                f,
                "Word must start and end with a vowel and be at least {} characters long",
                min_length
            ),
            Rule::LetterExactlyThrice { min_length } => write!(
                f,
                "Word must contain at least one letter that appears exactly three times and be at least {} characters long",
                min_length
            ),
            Rule::Palindrome { min_length } => write!(
                f,
                "Word must be a palindrome and be at least {} characters long",
                min_length
            ),
            Rule::NoRepeatedLetters { min_length } => write!(
                f,
                "Word must have no repeating letters and be at least {} characters long",
                min_length
            ),
            Rule::VowelConsonantCount {
                vowels,
                consonants,
                min_length,
            } => write!(
                f,
                "Word must contain exactly {} vowels and {} consonants and be at least {} characters long",
                vowels, consonants, min_length
            ),
            Rule::SameLetterThrice { min_length } => write!(
                f,
                "Word must contain the same letter three times and be at least {} characters long",
                min_length
            ),
            Rule::BalancedVowels { min_length } => write!(
                f,
                "Word must have an equal number of vowels and consonants and be at least {} characters long",
                min_length
            ),
        }
    }
}

/// Build the full rule rotation for a minimum length and seed letter.
///
/// The order is fixed; rooms move through it by index.
pub fn generate_rules(min_length: usize, letter: char) -> Vec<Rule> {
    vec![
        Rule::MinLength { min_length },
        Rule::ContainsLetter { letter, min_length },
        Rule::ExcludesLetter { letter, min_length },
        Rule::StartsWithLetter { letter, min_length },
        Rule::EndsWithLetter { letter, min_length },
        Rule::EndsWith {
            suffix: "tion".to_string(),
            min_length,
        },
        Rule::StartsWith {
            prefix: "co".to_string(),
            min_length,
        },
        Rule::DoubleLetterPairs {
            pairs: 2,
            min_length,
        },
        Rule::ExactLength {
            length: min_length + 2,
        },
        Rule::ConsonantBoundaries { min_length },
        Rule::VowelBoundaries { min_length },
        Rule::LetterExactlyThrice { min_length },
        Rule::Palindrome { min_length },
        Rule::NoRepeatedLetters { min_length },
        Rule::VowelConsonantCount {
            vowels: 3,
            consonants: 3,
            min_length,
        },
        Rule::SameLetterThrice { min_length },
        Rule::BalancedVowels { min_length },
    ]
}

/// Number of rules in one rotation
pub fn rule_count() -> usize {
    generate_rules(DEFAULT_MIN_WORD_LENGTH, 'a').len()
}

/// Rule at `index` in the rotation, wrapping past the end.
pub fn rule_at(index: usize, min_length: usize, letter: char) -> Rule {
    let mut rules = generate_rules(min_length, letter);
    let index = index % rules.len();
    rules.swap_remove(index)
}

/// Index of the rule that follows `index` in the rotation.
pub fn next_rule_index(index: usize) -> usize {
    (index + 1) % rule_count()
}

pub fn random_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    rng.random_range(b'a'..=b'z') as char
}

fn letter_counts(word: &str) -> HashMap<char, usize> {
    let mut counts = HashMap::new();
    for ch in word.chars() {
        *counts.entry(ch).or_insert(0) += 1;
    }
    counts
}

fn count_in(word: &str, set: &str) -> usize {
    word.chars().filter(|ch| set.contains(*ch)).count()
}

fn bounded_by(word: &str, set: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    match (chars.first(), chars.last()) {
        (Some(first), Some(last)) if chars.len() >= 2 => {
            set.contains(*first) && set.contains(*last)
        }
        _ => false,
    }
}

// Non-overlapping runs: "aaaa" is two pairs, "aaa" is one.
fn double_letter_pairs(word: &str) -> usize {
    let chars: Vec<char> = word.chars().collect();
    let mut pairs = 0;
    let mut i = 0;
    while i + 1 < chars.len() {
        if chars[i].is_ascii_alphabetic() && chars[i] == chars[i + 1] {
            pairs += 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    pairs
}

fn number_word(n: usize) -> String {
    match n {
        1 => "one".to_string(),
        2 => "two".to_string(),
        3 => "three".to_string(),
        other => other.to_string(),
    }
}
