//! Locale-style ordering for glossary terms.
//!
//! Terms compare on three levels, the way a root-locale collator does:
//! base letters first (case and accents ignored), then accents, then case
//! with lowercase ahead of uppercase. Whitespace and punctuation sort ahead
//! of digits, and digits ahead of letters.

use icu_normalizer::DecomposingNormalizerBorrowed;
use std::cmp::Ordering;

/// Sort key for a single term. Field order is comparison priority.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    primary: Vec<(CharClass, char)>,
    secondary: Vec<char>,
    tertiary: Vec<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space,
    Punctuation,
    Digit,
    Letter,
}

impl CharClass {
    fn of(ch: char) -> Self {
        if ch.is_whitespace() {
            CharClass::Space
        } else if ch.is_numeric() {
            CharClass::Digit
        } else if ch.is_alphabetic() {
            CharClass::Letter
        } else {
            CharClass::Punctuation
        }
    }
}

pub fn collation_key(term: &str) -> CollationKey {
    let decomposed = DecomposingNormalizerBorrowed::new_nfd().normalize(term);
    let mut primary = Vec::with_capacity(decomposed.len());
    let mut secondary = Vec::new();
    let mut tertiary = Vec::with_capacity(decomposed.len());
    for ch in decomposed.chars() {
        if is_combining_mark(ch) {
            secondary.push(ch);
            continue;
        }
        // Placeholder keeps accent positions aligned with their base letters.
        secondary.push('\0');
        tertiary.push(ch.is_uppercase());
        for lower in ch.to_lowercase() {
            primary.push((CharClass::of(lower), lower));
        }
    }
    CollationKey {
        primary,
        secondary,
        tertiary,
    }
}

/// Compares two terms with [`collation_key`] semantics.
pub fn compare_terms(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

fn is_combining_mark(ch: char) -> bool {
    matches!(
        ch as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_is_ignored_at_primary_level() {
        assert_eq!(compare_terms("biga", "Gluten"), Ordering::Less);
        assert_eq!(compare_terms("Biga", "gluten"), Ordering::Less);
    }

    #[test]
    fn accents_do_not_move_a_term_out_of_its_letter() {
        let mut terms = vec!["Pumpernickel", "Pâte Fermentée", "Poolish", "Pane"];
        terms.sort_by(|a, b| compare_terms(a, b));
        assert_eq!(
            terms,
            vec!["Pane", "Pâte Fermentée", "Poolish", "Pumpernickel"]
        );
    }

    #[test]
    fn unaccented_sorts_before_accented_when_otherwise_equal() {
        assert_eq!(compare_terms("pate", "pâte"), Ordering::Less);
    }

    #[test]
    fn lowercase_sorts_before_uppercase_when_otherwise_equal() {
        assert_eq!(compare_terms("lame", "Lame"), Ordering::Less);
        assert_eq!(compare_terms("Lame", "Lame"), Ordering::Equal);
    }

    #[test]
    fn digits_sort_before_letters() {
        assert_eq!(compare_terms("1:1:1 Feeding Ratio", "Autolyse"), Ordering::Less);
    }

    #[test]
    fn shorter_prefix_sorts_first() {
        assert_eq!(compare_terms("Proof", "Proofing"), Ordering::Less);
    }
}
