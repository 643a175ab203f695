//! Per-session presentation state: filters, the single expanded record and
//! its tab, and the learned set.

use crate::filter::{FilterState, FilterUpdate};
use crate::learned::{KeyValueStore, LearnedSet};
use crate::{ContentStore, GlossaryRecord};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// How long the renderer keeps a jump target highlighted.
pub const HIGHLIGHT_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailTab {
    #[default]
    Overview,
    Expert,
    Deep,
    Recipes,
}

impl DetailTab {
    pub const ALL: [DetailTab; 4] = [
        DetailTab::Overview,
        DetailTab::Expert,
        DetailTab::Deep,
        DetailTab::Recipes,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "overview" => Some(DetailTab::Overview),
            "expert" => Some(DetailTab::Expert),
            "deep" => Some(DetailTab::Deep),
            "recipes" => Some(DetailTab::Recipes),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetailTab::Overview => "overview",
            DetailTab::Expert => "expert",
            DetailTab::Deep => "deep",
            DetailTab::Recipes => "recipes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Expert => "Henry's Advice",
            DetailTab::Deep => "Deep Dive",
            DetailTab::Recipes => "Recipes",
        }
    }
}

impl fmt::Display for DetailTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Collapsed,
    Expanded { id: String, tab: DetailTab },
}

/// Asks the renderer to scroll to and briefly highlight a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrollSignal {
    pub target: String,
    pub highlight_ms: u64,
}

/// Badge colouring for categories and difficulties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Amber,
    Blue,
    Green,
    Indigo,
    Orange,
    Purple,
    Red,
    Rose,
    Slate,
    Teal,
    Yellow,
    Neutral,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Amber => "amber",
            Tone::Blue => "blue",
            Tone::Green => "green",
            Tone::Indigo => "indigo",
            Tone::Orange => "orange",
            Tone::Purple => "purple",
            Tone::Red => "red",
            Tone::Rose => "rose",
            Tone::Slate => "slate",
            Tone::Teal => "teal",
            Tone::Yellow => "yellow",
            Tone::Neutral => "neutral",
        }
    }
}

pub fn category_tone(category: &str) -> Tone {
    match category.to_ascii_lowercase().as_str() {
        "ingredient" => Tone::Amber,
        "tool" => Tone::Slate,
        "technique" => Tone::Blue,
        "process" => Tone::Purple,
        "bread" | "bread_type" => Tone::Orange,
        "pizza" => Tone::Rose,
        "schedule" => Tone::Teal,
        "scientific/technical" | "scientific" => Tone::Indigo,
        _ => Tone::Neutral,
    }
}

pub fn difficulty_tone(difficulty: &str) -> Tone {
    match difficulty.to_ascii_lowercase().as_str() {
        "beginner" => Tone::Green,
        "intermediate" => Tone::Yellow,
        "advanced" => Tone::Red,
        _ => Tone::Neutral,
    }
}

/// Owns one session's state and validates every transition against the
/// injected content store.
#[derive(Clone)]
pub struct PresentationController {
    content: Arc<ContentStore>,
    filters: FilterState,
    view: ViewState,
    learned: LearnedSet,
    persistence: Arc<dyn KeyValueStore>,
}

impl PresentationController {
    /// Starts collapsed with default filters; the learned set is read once
    /// from `persistence` under `learned_key`.
    pub fn new(
        content: Arc<ContentStore>,
        persistence: Arc<dyn KeyValueStore>,
        learned_key: impl Into<String>,
    ) -> Self {
        let learned = LearnedSet::load(persistence.as_ref(), learned_key);
        Self {
            content,
            filters: FilterState::default(),
            view: ViewState::Collapsed,
            learned,
            persistence,
        }
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn learned(&self) -> &LearnedSet {
        &self.learned
    }

    /// Updates one filter field. The view is left alone.
    pub fn set_filter(&mut self, update: FilterUpdate) {
        self.filters.apply(update);
    }

    /// Restores default filters and collapses. Quick mode is a display
    /// preference and survives.
    pub fn reset_all_filters(&mut self) {
        let quick_mode = self.filters.quick_mode;
        self.filters = FilterState {
            quick_mode,
            ..FilterState::default()
        };
        self.view = ViewState::Collapsed;
    }

    pub fn toggle_expand(&mut self, id: &str) {
        self.view = match &self.view {
            ViewState::Expanded { id: current, .. } if current == id => ViewState::Collapsed,
            _ => ViewState::Expanded {
                id: id.to_string(),
                tab: DetailTab::default(),
            },
        };
    }

    /// Ignored while collapsed.
    pub fn select_tab(&mut self, tab: DetailTab) {
        if let ViewState::Expanded { tab: current, .. } = &mut self.view {
            *current = tab;
        }
    }

    /// Clears filters and expands `target` so it is guaranteed visible.
    /// Unknown ids are a silent no-op.
    pub fn jump_to_related(&mut self, target: &str) -> Option<ScrollSignal> {
        if !self.content.contains(target) {
            debug!(id = target, "ignoring jump to unknown term");
            return None;
        }
        self.reset_all_filters();
        self.view = ViewState::Expanded {
            id: target.to_string(),
            tab: DetailTab::default(),
        };
        Some(ScrollSignal {
            target: target.to_string(),
            highlight_ms: HIGHLIGHT_MS,
        })
    }

    /// Flips `id` in the learned set and writes the whole set back. A failed
    /// write is logged; the in-memory set still reflects the toggle.
    pub fn toggle_learned(&mut self, id: &str) -> bool {
        let learned = self.learned.toggle(id);
        if let Err(err) = self.learned.save(self.persistence.as_ref()) {
            warn!(id, error = %err, "failed to persist learned terms");
        }
        learned
    }

    pub fn toggle_quick_mode(&mut self) -> bool {
        self.filters.quick_mode = !self.filters.quick_mode;
        self.filters.quick_mode
    }

    pub fn quick_mode(&self) -> bool {
        self.filters.quick_mode
    }

    pub fn visible(&self) -> Vec<&GlossaryRecord> {
        self.content.visible(&self.filters)
    }

    pub fn expanded_id(&self) -> Option<&str> {
        match &self.view {
            ViewState::Expanded { id, .. } => Some(id),
            ViewState::Collapsed => None,
        }
    }

    /// The expanded record, if it still resolves.
    pub fn expanded_record(&self) -> Option<&GlossaryRecord> {
        self.expanded_id().and_then(|id| self.content.get(id))
    }

    pub fn active_tab(&self) -> DetailTab {
        match &self.view {
            ViewState::Expanded { tab, .. } => *tab,
            ViewState::Collapsed => DetailTab::default(),
        }
    }
}
