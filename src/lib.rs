mod data;

pub mod collation;
pub mod export;
pub mod filter;
pub mod learned;
pub mod lookup;
pub mod presentation;
pub mod resources;
pub mod widgets;

#[cfg(feature = "assistant")]
pub mod assistant;
#[cfg(feature = "web")]
pub mod sessions;
#[cfg(feature = "web")]
pub mod web;

pub use data::{
    BookRef, GlossaryRecord, LearningLink, LearningPath, MediaKind, RecipeRef, ResourceLink,
    TermLinks, ToolLink, Troubleshooting, Widget,
};
pub use filter::{FilterState, FilterUpdate, LetterFilter, Selection};
pub use presentation::{DetailTab, PresentationController, ScrollSignal, ViewState};

use data::BundledContent;
use fst::Map;
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;
use zstd::stream::decode_all;

static CONTENT_BYTES: &[u8] = include_bytes!(env!("CRUMB_CONTENT"));
static ID_FST_BYTES: &[u8] = include_bytes!(env!("CRUMB_ID_FST"));

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to decompress bundled glossary: {0}")]
    Decompress(#[from] std::io::Error),
    #[error("bundled glossary archive is invalid: {0}")]
    Archive(String),
    #[error("glossary JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate glossary id {0:?}")]
    DuplicateId(String),
    #[error("failed to build id index: {0}")]
    Index(#[from] fst::Error),
    #[error("id index covers {indexed} ids but the glossary holds {records} records")]
    IndexMismatch { indexed: usize, records: usize },
}

/// Read-only glossary content: records in their bundled order, learning
/// paths, "go deeper" links and an `fst` index from record id to position.
///
/// Built once and shared; nothing mutates it after construction.
pub struct ContentStore {
    records: Vec<GlossaryRecord>,
    paths: Vec<LearningPath>,
    term_links: Vec<TermLinks>,
    ids: Map<Vec<u8>>,
}

impl ContentStore {
    /// Decodes the content compiled in by build.rs.
    pub fn bundled() -> Result<Self, ContentError> {
        let decompressed = decode_all(Cursor::new(CONTENT_BYTES))?;
        let mut aligned: AlignedVec = AlignedVec::with_capacity(decompressed.len());
        aligned.extend_from_slice(&decompressed);
        let content = rkyv::from_bytes::<BundledContent, RkyvError>(aligned.as_slice())
            .map_err(|err| ContentError::Archive(err.to_string()))?;
        let ids = Map::new(ID_FST_BYTES.to_vec())?;
        if ids.len() != content.records.len() {
            return Err(ContentError::IndexMismatch {
                indexed: ids.len(),
                records: content.records.len(),
            });
        }
        debug!(
            records = content.records.len(),
            paths = content.paths.len(),
            "Decoded bundled glossary"
        );
        Ok(Self {
            records: content.records,
            paths: content.paths,
            term_links: Vec::new(),
            ids,
        }
        .with_term_links(content.term_links))
    }

    /// Builds a store from already-parsed records, rejecting duplicate ids.
    pub fn new(records: Vec<GlossaryRecord>, paths: Vec<LearningPath>) -> Result<Self, ContentError> {
        let mut sorted: Vec<(&str, u64)> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.id.as_str(), idx as u64))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(ContentError::DuplicateId(pair[0].0.to_string()));
        }
        let ids = Map::from_iter(sorted)?;
        Ok(Self {
            records,
            paths,
            term_links: Vec::new(),
            ids,
        })
    }

    /// Attaches "go deeper" links. Entries whose `term_id` is not a record,
    /// or that carry no links at all, are dropped.
    pub fn with_term_links(mut self, links: Vec<TermLinks>) -> Self {
        let offered = links.len();
        self.term_links = links
            .into_iter()
            .filter(|entry| self.contains(&entry.term_id) && !entry.is_empty())
            .collect();
        let dropped = offered - self.term_links.len();
        if dropped > 0 {
            debug!(dropped, kept = self.term_links.len(), "Dropped unresolved term links");
        }
        self
    }

    /// Parses `glossary.json`-shaped and `learning_paths.json`-shaped input.
    pub fn from_json(records_json: &str, paths_json: &str) -> Result<Self, ContentError> {
        let records: Vec<GlossaryRecord> = serde_json::from_str(records_json)?;
        let paths: Vec<LearningPath> = serde_json::from_str(paths_json)?;
        Self::new(records, paths)
    }

    pub fn records(&self) -> &[GlossaryRecord] {
        &self.records
    }

    pub fn paths(&self) -> &[LearningPath] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&GlossaryRecord> {
        self.ids
            .get(id)
            .and_then(|index| self.records.get(index as usize))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn path(&self, id: &str) -> Option<&LearningPath> {
        self.paths.iter().find(|path| path.id == id)
    }

    pub fn term_links(&self, id: &str) -> Option<&TermLinks> {
        self.term_links.iter().find(|entry| entry.term_id == id)
    }

    /// A record's related ids that resolve, in their curated order.
    pub fn resolve_related<'a>(&'a self, record: &'a GlossaryRecord) -> Vec<&'a GlossaryRecord> {
        record
            .related_term_ids
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// A path's members in the path's own order, dangling ids dropped.
    pub fn path_records(&self, path: &LearningPath) -> Vec<&GlossaryRecord> {
        path.term_ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Runs the filter engine over this store.
    pub fn visible(&self, state: &FilterState) -> Vec<&GlossaryRecord> {
        filter::visible_records(&self.records, &self.paths, state)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn record(id: &str, term: &str, category: &str, difficulty: &str) -> GlossaryRecord {
        GlossaryRecord {
            id: id.to_string(),
            term: term.to_string(),
            definition: format!("{term} is a bread-baking term."),
            short_definition: None,
            category: category.to_string(),
            difficulty: difficulty.to_string(),
            related_term_ids: Vec::new(),
            henrys_tips: Vec::new(),
            common_mistakes: Vec::new(),
            troubleshooting: Vec::new(),
            affiliate_tools: Vec::new(),
            links: Vec::new(),
            widgets: Vec::new(),
            book_ref: None,
            book_chapter: None,
            history: None,
            difficulty_explanation: None,
            pronunciation: None,
            youtube_query: None,
            starter_related: None,
            sources: Vec::new(),
            media_placeholder: Vec::new(),
            related_recipes: Vec::new(),
            alternate_questions: Vec::new(),
        }
    }

    pub fn path(id: &str, term_ids: &[&str]) -> LearningPath {
        LearningPath {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            term_ids: term_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    /// The two-record store used throughout the scenario tests.
    pub fn gluten_and_biga() -> ContentStore {
        let mut gluten = record("gluten", "Gluten", "Scientific", "Advanced");
        gluten.definition = "The protein network that traps gas.".to_string();
        gluten.related_term_ids = vec!["kneading".to_string(), "biga".to_string()];
        let mut biga = record("biga", "Biga", "Ingredient", "Intermediate");
        biga.definition = "A stiff Italian pre-ferment.".to_string();
        ContentStore::new(vec![gluten, biga], vec![path("basics", &["gluten", "missing"])])
            .expect("unique ids")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn bundled_content_decodes_and_indexes_every_record() {
        let store = ContentStore::bundled().expect("bundled content");
        assert!(!store.is_empty());
        for record in store.records() {
            assert_eq!(store.get(&record.id).map(|r| &r.term), Some(&record.term));
        }
        assert!(store.path("beginner-basics").is_some());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = ContentStore::new(
            vec![
                record("poolish", "Poolish", "Ingredient", "Intermediate"),
                record("poolish", "Poolish again", "Ingredient", "Intermediate"),
            ],
            Vec::new(),
        );
        assert!(matches!(result, Err(ContentError::DuplicateId(id)) if id == "poolish"));
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        let store = gluten_and_biga();
        assert!(store.get("kneading").is_none());
        assert!(!store.contains("kneading"));
        assert!(store.contains("biga"));
    }

    #[test]
    fn related_terms_drop_dangling_ids_without_error() {
        let store = gluten_and_biga();
        let gluten = store.get("gluten").unwrap();
        let related: Vec<_> = store
            .resolve_related(gluten)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(related, vec!["biga"]);
    }

    #[test]
    fn path_records_keep_curated_order_and_drop_missing() {
        let store = ContentStore::bundled().unwrap();
        let path = store.path("bread-types").unwrap();
        let ids: Vec<_> = store
            .path_records(path)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["boule", "focaccia", "epi"]);
    }

    #[test]
    fn bundled_term_links_keep_only_known_terms() {
        let store = ContentStore::bundled().unwrap();
        let poolish = store.term_links("poolish").expect("poolish has links");
        assert_eq!(poolish.youtube_videos.len(), 2);
        assert_eq!(poolish.academy_courses.len(), 1);
        assert_eq!(poolish.pantry_recipes.len(), 1);
        assert!(store.term_links("sponge").is_none());
        assert!(store.term_links("rubaud-method").is_none());
    }

    #[test]
    fn term_links_for_missing_records_or_without_links_are_dropped() {
        let link = LearningLink {
            title: "Mixing a biga".to_string(),
            url: "https://example.com/biga".to_string(),
            description: None,
        };
        let store = gluten_and_biga().with_term_links(vec![
            TermLinks {
                term_id: "biga".to_string(),
                youtube_videos: vec![link.clone()],
                academy_courses: Vec::new(),
                pantry_recipes: Vec::new(),
            },
            TermLinks {
                term_id: "kneading".to_string(),
                youtube_videos: vec![link],
                academy_courses: Vec::new(),
                pantry_recipes: Vec::new(),
            },
            TermLinks {
                term_id: "gluten".to_string(),
                youtube_videos: Vec::new(),
                academy_courses: Vec::new(),
                pantry_recipes: Vec::new(),
            },
        ]);
        assert_eq!(
            store.term_links("biga").map(|links| links.youtube_videos[0].title.as_str()),
            Some("Mixing a biga")
        );
        assert!(store.term_links("kneading").is_none());
        assert!(store.term_links("gluten").is_none());
    }

    #[test]
    fn from_json_parses_camel_case_fields() {
        let store = ContentStore::from_json(
            r#"[{"id":"lame","term":"Lame","definition":"A blade.","category":"Tool",
                 "difficulty":"Beginner","relatedTermIds":["scoring"],"bookRef":false}]"#,
            r#"[{"id":"tools","title":"Tools","description":"","termIds":["lame"]}]"#,
        )
        .unwrap();
        let lame = store.get("lame").unwrap();
        assert_eq!(lame.related_term_ids, vec!["scoring".to_string()]);
        assert_eq!(lame.book_ref, Some(BookRef::Flag(false)));
        assert_eq!(store.paths()[0].term_ids, vec!["lame".to_string()]);
    }
}
