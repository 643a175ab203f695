//! Public term lookup: the normalized projection served by `/api/term/:slug`
//! and printed by `crumb-gloss show`.

use crate::{ContentStore, GlossaryRecord, ToolLink};
use rapidfuzz::fuzz;
use serde::Serialize;

const MAX_SUGGESTIONS: usize = 3;
const MIN_SUGGESTION_SCORE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermProjection {
    pub name: String,
    pub slug: String,
    pub pronunciation: Option<String>,
    pub definition: String,
    pub short_definition: Option<String>,
    pub tips: Option<String>,
    pub difficulty: String,
    pub category: String,
    pub related_terms: Vec<String>,
    pub affiliate_links: Vec<ToolLink>,
    pub featured_in_book: bool,
    pub common_mistakes: Vec<String>,
    pub history: Option<String>,
    pub sources: Vec<String>,
    pub youtube_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermNotFound {
    pub error: String,
    pub message: String,
    pub available_terms_count: usize,
    pub suggestions: Vec<String>,
}

/// Projects the record with id `slug`, or explains why there is none.
pub fn project(store: &ContentStore, slug: &str) -> Result<TermProjection, TermNotFound> {
    match store.get(slug) {
        Some(record) => Ok(project_record(store, record)),
        None => Err(TermNotFound {
            error: "Term not found".to_string(),
            message: format!("No glossary term found with slug: {slug}"),
            available_terms_count: store.len(),
            suggestions: suggest(store, slug),
        }),
    }
}

pub fn project_record(store: &ContentStore, record: &GlossaryRecord) -> TermProjection {
    let tips = record.henrys_tips.join("\n\n");
    TermProjection {
        name: record.term.clone(),
        slug: record.id.clone(),
        pronunciation: non_empty(&record.pronunciation),
        definition: record.definition.clone(),
        short_definition: non_empty(&record.short_definition),
        tips: (!tips.is_empty()).then_some(tips),
        difficulty: record.difficulty.clone(),
        category: record.category.clone(),
        related_terms: store
            .resolve_related(record)
            .into_iter()
            .map(|related| related.id.clone())
            .collect(),
        affiliate_links: merged_links(record),
        featured_in_book: record
            .book_ref
            .as_ref()
            .is_some_and(|book_ref| book_ref.is_featured()),
        common_mistakes: record.common_mistakes.clone(),
        history: non_empty(&record.history),
        sources: record.sources.clone(),
        youtube_query: non_empty(&record.youtube_query),
    }
}

/// Affiliate tools first, then resource links whose URL has not been seen.
pub fn merged_links(record: &GlossaryRecord) -> Vec<ToolLink> {
    let mut links = record.affiliate_tools.clone();
    for link in &record.links {
        if link.url.is_empty() || links.iter().any(|existing| existing.url == link.url) {
            continue;
        }
        links.push(ToolLink {
            name: link.label.clone(),
            url: link.url.clone(),
        });
    }
    links
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|text| !text.is_empty()).cloned()
}

/// Close ids for a mistyped slug, best first.
fn suggest(store: &ContentStore, slug: &str) -> Vec<String> {
    let needle = slug.to_lowercase();
    let mut scored: Vec<(f64, &str)> = store
        .records()
        .iter()
        .map(|record| {
            let score = fuzz::ratio(needle.chars(), record.id.chars());
            (score, record.id.as_str())
        })
        .filter(|(score, _)| *score >= MIN_SUGGESTION_SCORE)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, id)| id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::gluten_and_biga;

    #[test]
    fn projection_drops_dangling_related_ids() {
        let store = gluten_and_biga();
        let projection = project(&store, "gluten").unwrap();
        assert_eq!(projection.name, "Gluten");
        assert_eq!(projection.slug, "gluten");
        assert_eq!(projection.related_terms, vec!["biga".to_string()]);
        assert_eq!(projection.tips, None);
        assert!(!projection.featured_in_book);
    }

    #[test]
    fn affiliate_links_are_deduplicated_by_url() {
        let store = ContentStore::bundled().unwrap();
        let banneton = store.get("banneton").unwrap();
        let links = merged_links(banneton);
        let mut urls: Vec<&str> = links.iter().map(|link| link.url.as_str()).collect();
        let total = urls.len();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), total);
        assert_eq!(links[0], banneton.affiliate_tools[0]);
        assert!(links.len() < banneton.affiliate_tools.len() + banneton.links.len());
    }

    #[test]
    fn tips_are_joined_with_blank_lines() {
        let store = ContentStore::bundled().unwrap();
        let record = store
            .records()
            .iter()
            .find(|record| record.henrys_tips.len() > 1)
            .unwrap();
        let projection = project_record(&store, record);
        assert_eq!(projection.tips, Some(record.henrys_tips.join("\n\n")));
    }

    #[test]
    fn book_flag_follows_book_ref() {
        let store = ContentStore::bundled().unwrap();
        assert!(project(&store, "bakers-percentage").unwrap().featured_in_book);
    }

    #[test]
    fn unknown_slug_reports_count_and_suggestions() {
        let store = ContentStore::bundled().unwrap();
        let missing = project(&store, "poolsh").unwrap_err();
        assert_eq!(missing.error, "Term not found");
        assert_eq!(missing.message, "No glossary term found with slug: poolsh");
        assert_eq!(missing.available_terms_count, store.len());
        assert_eq!(missing.suggestions.first().map(String::as_str), Some("poolish"));
        assert!(missing.suggestions.len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn unrelated_slug_has_no_suggestions() {
        let store = gluten_and_biga();
        let missing = project(&store, "zzzzzzzzzzzz").unwrap_err();
        assert!(missing.suggestions.is_empty());
    }

    #[test]
    fn projection_serializes_camel_case_with_nulls() {
        let store = gluten_and_biga();
        let value = serde_json::to_value(project(&store, "biga").unwrap()).unwrap();
        assert_eq!(value["shortDefinition"], serde_json::Value::Null);
        assert_eq!(value["featuredInBook"], serde_json::Value::Bool(false));
        assert!(value["affiliateLinks"].as_array().unwrap().is_empty());
    }
}
