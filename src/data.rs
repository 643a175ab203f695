use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// One glossary entry as stored in `data/glossary.json`.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryRecord {
    pub id: String,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub short_definition: Option<String>,
    pub category: String,
    pub difficulty: String,
    #[serde(default)]
    pub related_term_ids: Vec<String>,
    #[serde(default)]
    pub henrys_tips: Vec<String>,
    #[serde(default)]
    pub common_mistakes: Vec<String>,
    #[serde(default)]
    pub troubleshooting: Vec<Troubleshooting>,
    #[serde(default)]
    pub affiliate_tools: Vec<ToolLink>,
    #[serde(default)]
    pub links: Vec<ResourceLink>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub book_ref: Option<BookRef>,
    #[serde(default)]
    pub book_chapter: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub difficulty_explanation: Option<String>,
    #[serde(default)]
    pub pronunciation: Option<String>,
    #[serde(default)]
    pub youtube_query: Option<String>,
    #[serde(default)]
    pub starter_related: Option<bool>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub media_placeholder: Vec<MediaKind>,
    #[serde(default)]
    pub related_recipes: Vec<RecipeRef>,
    #[serde(default)]
    pub alternate_questions: Vec<String>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Troubleshooting {
    pub problem: String,
    pub solution: String,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolLink {
    pub name: String,
    pub url: String,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceLink {
    pub label: String,
    pub url: String,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecipeRef {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Inline tools a record can enable on its detail view.
#[derive(
    Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum Widget {
    Calculator,
    Timer,
    Converter,
}

#[derive(
    Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Book references are either a title or a bare "is in the book" flag.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BookRef {
    Flag(bool),
    Title(String),
}

impl BookRef {
    /// `false` and an empty title do not count.
    pub fn is_featured(&self) -> bool {
        match self {
            BookRef::Flag(flag) => *flag,
            BookRef::Title(title) => !title.is_empty(),
        }
    }
}

/// A curated, ordered subset of record ids.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub term_ids: Vec<String>,
}

/// "Go deeper" material for one record: videos, courses and recipes.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TermLinks {
    pub term_id: String,
    #[serde(default)]
    pub youtube_videos: Vec<LearningLink>,
    #[serde(default)]
    pub academy_courses: Vec<LearningLink>,
    #[serde(default)]
    pub pantry_recipes: Vec<LearningLink>,
}

impl TermLinks {
    pub fn is_empty(&self) -> bool {
        self.youtube_videos.is_empty()
            && self.academy_courses.is_empty()
            && self.pantry_recipes.is_empty()
    }
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LearningLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything build.rs archives into the binary.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct BundledContent {
    pub records: Vec<GlossaryRecord>,
    pub paths: Vec<LearningPath>,
    pub term_links: Vec<TermLinks>,
}
