//! The filter engine: a pure function from content plus filter state to the
//! ordered list of visible records, and the facet queries that drive the
//! filter controls.
//!
//! Every filter value is accepted. Values that match nothing simply produce
//! an empty list; nothing here can fail.

use crate::collation::collation_key;
use crate::{GlossaryRecord, LearningPath};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Sentinel shown in the UI for "no restriction".
pub const ALL: &str = "All";
/// Letter bucket for terms that start with a decimal digit.
pub const DIGIT_BUCKET: &str = "#";

const DIFFICULTY_ORDER: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

/// Exact-match selection for category and difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn parse(value: &str) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => ALL,
            Selection::Only(value) => value,
        }
    }

    fn admits(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alphabet navigation filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LetterFilter {
    #[default]
    All,
    /// Terms whose first character is an ASCII digit.
    Digit,
    /// Terms whose uppercased first character equals this bucket exactly.
    Bucket(String),
}

impl LetterFilter {
    pub fn parse(value: &str) -> Self {
        match value {
            ALL => LetterFilter::All,
            DIGIT_BUCKET => LetterFilter::Digit,
            other => LetterFilter::Bucket(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LetterFilter::All => ALL,
            LetterFilter::Digit => DIGIT_BUCKET,
            LetterFilter::Bucket(letter) => letter,
        }
    }

    fn admits(&self, term: &str) -> bool {
        match self {
            LetterFilter::All => true,
            LetterFilter::Digit => starts_with_digit(term),
            LetterFilter::Bucket(letter) => first_char_upper(term).as_deref() == Some(letter),
        }
    }
}

impl fmt::Display for LetterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub search_text: String,
    pub category: Selection,
    pub difficulty: Selection,
    pub active_path_id: Option<String>,
    pub selected_letter: LetterFilter,
    /// Display density only; never changes which records are included.
    pub quick_mode: bool,
}

impl FilterState {
    /// Applies one field update and leaves every other field alone.
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Search(text) => self.search_text = text,
            FilterUpdate::Category(selection) => self.category = selection,
            FilterUpdate::Difficulty(selection) => self.difficulty = selection,
            FilterUpdate::Path(path) => self.active_path_id = path,
            FilterUpdate::Letter(letter) => self.selected_letter = letter,
            FilterUpdate::QuickMode(enabled) => self.quick_mode = enabled,
        }
    }

    /// True when no inclusion predicate is active.
    pub fn is_unfiltered(&self) -> bool {
        self.search_text.is_empty()
            && self.category == Selection::All
            && self.difficulty == Selection::All
            && self.active_path_id.is_none()
            && self.selected_letter == LetterFilter::All
    }
}

/// A single-field change to [`FilterState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Search(String),
    Category(Selection),
    Difficulty(Selection),
    Path(Option<String>),
    Letter(LetterFilter),
    QuickMode(bool),
}

impl FilterUpdate {
    /// Parses a `field=value` pair from a form or the command line.
    ///
    /// Returns `None` only for an unknown field name; any value is accepted.
    pub fn parse(field: &str, value: &str) -> Option<Self> {
        let update = match field {
            "search" | "q" => FilterUpdate::Search(value.to_string()),
            "category" => FilterUpdate::Category(Selection::parse(value)),
            "difficulty" => FilterUpdate::Difficulty(Selection::parse(value)),
            "path" => FilterUpdate::Path(match value {
                "" | ALL => None,
                id => Some(id.to_string()),
            }),
            "letter" => FilterUpdate::Letter(LetterFilter::parse(value)),
            "quick" => FilterUpdate::QuickMode(matches!(value, "1" | "true" | "on")),
            _ => return None,
        };
        Some(update)
    }
}

/// Returns the records admitted by every active predicate, sorted by term.
///
/// An unknown `active_path_id` behaves as if no path were selected.
pub fn visible_records<'a>(
    records: &'a [GlossaryRecord],
    paths: &[LearningPath],
    state: &FilterState,
) -> Vec<&'a GlossaryRecord> {
    let path_members: Option<HashSet<&str>> = state
        .active_path_id
        .as_deref()
        .and_then(|id| paths.iter().find(|path| path.id == id))
        .map(|path| path.term_ids.iter().map(String::as_str).collect());
    let needle = state.search_text.to_lowercase();

    let mut visible: Vec<&GlossaryRecord> = records
        .iter()
        .filter(|record| {
            path_members
                .as_ref()
                .is_none_or(|members| members.contains(record.id.as_str()))
        })
        .filter(|record| state.selected_letter.admits(&record.term))
        .filter(|record| matches_search(record, &needle))
        .filter(|record| state.category.admits(&record.category))
        .filter(|record| state.difficulty.admits(&record.difficulty))
        .collect();
    visible.sort_by_cached_key(|record| (collation_key(&record.term), record.id.clone()));
    visible
}

fn matches_search(record: &GlossaryRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.term.to_lowercase().contains(needle)
        || record.definition.to_lowercase().contains(needle)
}

/// Distinct categories, sorted lexicographically.
pub fn categories(records: &[GlossaryRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct difficulties: Beginner, Intermediate, Advanced first, then any
/// other value in the order it was first seen.
pub fn difficulties(records: &[GlossaryRecord]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for record in records {
        if !seen.contains(&record.difficulty) {
            seen.push(record.difficulty.clone());
        }
    }
    seen.sort_by_key(|difficulty| difficulty_rank(difficulty));
    seen
}

fn difficulty_rank(difficulty: &str) -> usize {
    DIFFICULTY_ORDER
        .iter()
        .position(|known| *known == difficulty)
        .unwrap_or(DIFFICULTY_ORDER.len())
}

/// First-letter buckets with at least one member; digits collapse into `#`.
pub fn letter_buckets(records: &[GlossaryRecord]) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|record| {
            if starts_with_digit(&record.term) {
                Some(DIGIT_BUCKET.to_string())
            } else {
                first_char_upper(&record.term)
            }
        })
        .collect()
}

/// The alphabet navigation row: `All`, `A`..=`Z`, then `#`.
pub fn alphabet() -> Vec<String> {
    std::iter::once(ALL.to_string())
        .chain(('A'..='Z').map(String::from))
        .chain(std::iter::once(DIGIT_BUCKET.to_string()))
        .collect()
}

fn starts_with_digit(term: &str) -> bool {
    term.chars().next().is_some_and(|ch| ch.is_ascii_digit())
}

fn first_char_upper(term: &str) -> Option<String> {
    term.chars().next().map(|ch| ch.to_uppercase().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentStore;
    use crate::collation::compare_terms;
    use crate::test_support::{gluten_and_biga, path, record};
    use std::cmp::Ordering;

    fn terms(records: &[&GlossaryRecord]) -> Vec<String> {
        records.iter().map(|r| r.term.clone()).collect()
    }

    fn all_filters() -> FilterState {
        FilterState::default()
    }

    #[test]
    fn unfiltered_state_lists_everything_alphabetically() {
        let store = gluten_and_biga();
        assert_eq!(terms(&store.visible(&all_filters())), vec!["Biga", "Gluten"]);
    }

    #[test]
    fn letter_filter_keeps_matching_first_character() {
        let store = gluten_and_biga();
        let state = FilterState {
            selected_letter: LetterFilter::parse("G"),
            ..all_filters()
        };
        assert_eq!(terms(&store.visible(&state)), vec!["Gluten"]);
    }

    #[test]
    fn letter_filter_compares_first_character_only() {
        let store = gluten_and_biga();
        let state = FilterState {
            selected_letter: LetterFilter::parse("GL"),
            ..all_filters()
        };
        assert!(store.visible(&state).is_empty());
    }

    #[test]
    fn lowercase_letter_is_accepted_but_matches_nothing() {
        let store = gluten_and_biga();
        let state = FilterState {
            selected_letter: LetterFilter::parse("g"),
            ..all_filters()
        };
        assert!(store.visible(&state).is_empty());
    }

    #[test]
    fn digit_bucket_keeps_terms_starting_with_a_digit() {
        let store = ContentStore::new(
            vec![
                record("111", "1:1:1 Feeding Ratio", "Process", "Beginner"),
                record("lame", "Lame", "Tool", "Beginner"),
            ],
            Vec::new(),
        )
        .unwrap();
        let state = FilterState {
            selected_letter: LetterFilter::Digit,
            ..all_filters()
        };
        assert_eq!(terms(&store.visible(&state)), vec!["1:1:1 Feeding Ratio"]);
    }

    #[test]
    fn search_ignores_difficulty_field() {
        let store = gluten_and_biga();
        let state = FilterState {
            search_text: "ADVANCED".to_string(),
            ..all_filters()
        };
        assert!(store.visible(&state).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_term_and_definition() {
        let store = gluten_and_biga();
        let by_term = FilterState {
            search_text: "GLU".to_string(),
            ..all_filters()
        };
        assert_eq!(terms(&store.visible(&by_term)), vec!["Gluten"]);
        let by_definition = FilterState {
            search_text: "italian".to_string(),
            ..all_filters()
        };
        assert_eq!(terms(&store.visible(&by_definition)), vec!["Biga"]);
    }

    #[test]
    fn unknown_category_fails_open_to_empty() {
        let store = gluten_and_biga();
        let state = FilterState {
            category: Selection::parse("Pastry"),
            ..all_filters()
        };
        assert!(store.visible(&state).is_empty());
    }

    #[test]
    fn unknown_path_is_ignored() {
        let store = gluten_and_biga();
        let state = FilterState {
            active_path_id: Some("no-such-path".to_string()),
            ..all_filters()
        };
        assert_eq!(store.visible(&state).len(), 2);
    }

    #[test]
    fn known_path_restricts_to_members() {
        let store = gluten_and_biga();
        let state = FilterState {
            active_path_id: Some("basics".to_string()),
            ..all_filters()
        };
        assert_eq!(terms(&store.visible(&state)), vec!["Gluten"]);
    }

    #[test]
    fn path_results_are_resorted_alphabetically() {
        let store = ContentStore::new(
            vec![
                record("scoring", "Scoring", "Technique", "Beginner"),
                record("autolyse", "Autolyse", "Technique", "Intermediate"),
                record("lame", "Lame", "Tool", "Beginner"),
            ],
            vec![path("p", &["scoring", "lame", "autolyse"])],
        )
        .unwrap();
        let state = FilterState {
            active_path_id: Some("p".to_string()),
            ..all_filters()
        };
        assert_eq!(
            terms(&store.visible(&state)),
            vec!["Autolyse", "Lame", "Scoring"]
        );
    }

    #[test]
    fn quick_mode_never_changes_membership() {
        let store = ContentStore::bundled().unwrap();
        let normal = all_filters();
        let quick = FilterState {
            quick_mode: true,
            ..all_filters()
        };
        assert_eq!(store.visible(&normal), store.visible(&quick));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let store = ContentStore::bundled().unwrap();
        let state = FilterState {
            search_text: "dough".to_string(),
            ..all_filters()
        };
        assert_eq!(store.visible(&state), store.visible(&state));
    }

    #[test]
    fn combined_predicates_equal_intersection_of_each() {
        let store = ContentStore::bundled().unwrap();
        let singles = vec![
            FilterState {
                search_text: "dough".to_string(),
                ..all_filters()
            },
            FilterState {
                difficulty: Selection::parse("Beginner"),
                ..all_filters()
            },
            FilterState {
                active_path_id: Some("beginner-basics".to_string()),
                ..all_filters()
            },
            FilterState {
                selected_letter: LetterFilter::parse("S"),
                ..all_filters()
            },
        ];
        let combined = FilterState {
            search_text: "dough".to_string(),
            difficulty: Selection::parse("Beginner"),
            active_path_id: Some("beginner-basics".to_string()),
            selected_letter: LetterFilter::parse("S"),
            ..all_filters()
        };

        let mut expected: Option<HashSet<&str>> = None;
        for state in &singles {
            let ids: HashSet<&str> = store.visible(state).iter().map(|r| r.id.as_str()).collect();
            expected = Some(match expected {
                None => ids,
                Some(acc) => acc.intersection(&ids).copied().collect(),
            });
        }
        let actual: HashSet<&str> = store
            .visible(&combined)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(Some(actual), expected);
        assert!(!store.visible(&combined).is_empty());
    }

    #[test]
    fn output_is_sorted_by_collation() {
        let store = ContentStore::bundled().unwrap();
        let visible = store.visible(&all_filters());
        for pair in visible.windows(2) {
            assert_ne!(
                compare_terms(&pair[0].term, &pair[1].term),
                Ordering::Greater,
                "{} should not sort after {}",
                pair[0].term,
                pair[1].term
            );
        }
        let position = |id: &str| visible.iter().position(|r| r.id == id).unwrap();
        assert!(position("pate-fermentee") < position("poolish"));
        assert!(position("1-1-1-feeding") < position("autolyse"));
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let store = gluten_and_biga();
        assert_eq!(categories(store.records()), vec!["Ingredient", "Scientific"]);
    }

    #[test]
    fn difficulties_follow_semantic_rank_with_unknowns_last() {
        let records = vec![
            record("a", "A", "X", "Expert"),
            record("b", "B", "X", "Advanced"),
            record("c", "C", "X", "Novice"),
            record("d", "D", "X", "Beginner"),
            record("e", "E", "X", "Advanced"),
        ];
        assert_eq!(
            difficulties(&records),
            vec!["Beginner", "Advanced", "Expert", "Novice"]
        );
    }

    #[test]
    fn letter_buckets_collapse_digits() {
        let records = vec![
            record("a", "autolyse", "X", "Beginner"),
            record("b", "1:1:1", "X", "Beginner"),
            record("c", "Épi", "X", "Beginner"),
        ];
        let buckets: Vec<_> = letter_buckets(&records).into_iter().collect();
        assert_eq!(buckets, vec!["#", "A", "É"]);
    }

    #[test]
    fn filter_update_parse_accepts_any_value() {
        assert_eq!(
            FilterUpdate::parse("category", "Pastry"),
            Some(FilterUpdate::Category(Selection::Only("Pastry".to_string())))
        );
        assert_eq!(
            FilterUpdate::parse("path", "All"),
            Some(FilterUpdate::Path(None))
        );
        assert_eq!(FilterUpdate::parse("colour", "red"), None);
    }

    #[test]
    fn alphabet_row_has_all_letters_and_digit_bucket() {
        let row = alphabet();
        assert_eq!(row.first().map(String::as_str), Some("All"));
        assert_eq!(row.last().map(String::as_str), Some("#"));
        assert_eq!(row.len(), 28);
    }
}
