use crate::assistant::Conversation;
use crate::learned::{KeyValueStore, LEARNED_KEY};
use crate::{ContentStore, PresentationController, ScrollSignal};
use parking_lot::RwLock;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

pub const DEFAULT_MAX_SESSIONS: usize = 4096;
const SESSION_ID_LEN: usize = 24;

/// One browser session's controller, chat transcript and render-once UI
/// signals.
pub struct Session {
    pub controller: PresentationController,
    pub conversation: Conversation,
    pending_scroll: Option<ScrollSignal>,
    last_seen_ts: u64,
}

impl Session {
    pub fn set_scroll(&mut self, signal: ScrollSignal) {
        self.pending_scroll = Some(signal);
    }

    /// Returns the pending scroll signal and clears it.
    pub fn take_scroll(&mut self) -> Option<ScrollSignal> {
        self.pending_scroll.take()
    }
}

/// Live sessions keyed by cookie id. The registry is capped; when full, the
/// least recently seen session is dropped. Learned terms survive eviction
/// when the shared store is durable; a process-local store forgets them
/// along with the session.
pub struct SessionRegistry {
    content: Arc<ContentStore>,
    persistence: Arc<dyn KeyValueStore>,
    sessions: RwLock<HashMap<String, Session>>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(
        content: Arc<ContentStore>,
        persistence: Arc<dyn KeyValueStore>,
        max_sessions: usize,
    ) -> Self {
        Self {
            content,
            persistence,
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn content(&self) -> &Arc<ContentStore> {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Runs `f` against the session, creating it on first use.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let now = now_ts();
        let mut guard = self.sessions.write();
        if guard.len() >= self.max_sessions && !guard.contains_key(session_id) {
            if let Some(oldest) = oldest_session_key(&guard) {
                debug!(session = %oldest, "evicting idle session");
                guard.remove(&oldest);
                if !self.persistence.is_durable() {
                    if let Err(err) = self.persistence.remove(&learned_key_for(&oldest)) {
                        warn!(session = %oldest, error = %err, "failed to drop learned terms");
                    }
                }
            }
        }
        let session = guard.entry(session_id.to_string()).or_insert_with(|| Session {
            controller: PresentationController::new(
                self.content.clone(),
                self.persistence.clone(),
                learned_key_for(session_id),
            ),
            conversation: Conversation::default(),
            pending_scroll: None,
            last_seen_ts: now,
        });
        session.last_seen_ts = now;
        f(session)
    }
}

pub fn learned_key_for(session_id: &str) -> String {
    format!("{LEARNED_KEY}.{session_id}")
}

pub fn generate_session_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Accepts only ids this module could have generated.
pub fn is_valid_session_id(candidate: &str) -> bool {
    candidate.len() == SESSION_ID_LEN && candidate.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn oldest_session_key(sessions: &HashMap<String, Session>) -> Option<String> {
    sessions
        .iter()
        .min_by_key(|(_, session)| session.last_seen_ts)
        .map(|(key, _)| key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterUpdate;
    use crate::learned::{JsonFileStore, MemoryStore};
    use crate::test_support::gluten_and_biga;

    fn registry(max: usize) -> (SessionRegistry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (
            SessionRegistry::new(Arc::new(gluten_and_biga()), store.clone(), max),
            store,
        )
    }

    #[test]
    fn sessions_keep_independent_state() {
        let (registry, _) = registry(8);
        registry.with_session("a", |s| {
            s.controller.set_filter(FilterUpdate::Search("glu".to_string()))
        });
        let a = registry.with_session("a", |s| s.controller.visible().len());
        let b = registry.with_session("b", |s| s.controller.visible().len());
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn learned_terms_are_scoped_per_session() {
        let (registry, store) = registry(8);
        registry.with_session("a", |s| s.controller.toggle_learned("biga"));
        assert_eq!(
            store.get("learnedTerms.a").unwrap().as_deref(),
            Some(r#"["biga"]"#)
        );
        assert!(!registry.with_session("b", |s| s.controller.learned().contains("biga")));
    }

    #[test]
    fn full_registry_evicts_a_session_and_reloads_durable_learned_terms() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path()).unwrap());
        let registry = SessionRegistry::new(Arc::new(gluten_and_biga()), store, 1);
        registry.with_session("a", |s| s.controller.toggle_learned("gluten"));
        registry.with_session("b", |_| ());
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains("a"));
        assert!(registry.with_session("a", |s| s.controller.learned().contains("gluten")));
    }

    #[test]
    fn evicting_from_a_memory_store_drops_learned_keys() {
        let (registry, store) = registry(4);
        for n in 0..1000 {
            let id = format!("session-{n}");
            registry.with_session(&id, |s| s.controller.toggle_learned("biga"));
        }
        assert_eq!(registry.len(), 4);
        let kept = (0..1000)
            .filter(|n| {
                let key = learned_key_for(&format!("session-{n}"));
                store.get(&key).unwrap().is_some()
            })
            .count();
        assert_eq!(kept, 4);
    }

    #[test]
    fn new_sessions_open_with_the_greeting() {
        let (registry, _) = registry(4);
        let turns = registry.with_session("a", |s| s.conversation.turns().len());
        assert_eq!(turns, 1);
    }

    #[test]
    fn scroll_signal_is_delivered_once() {
        let (registry, _) = registry(4);
        registry.with_session("a", |s| {
            let signal = s.controller.jump_to_related("biga").unwrap();
            s.set_scroll(signal);
        });
        assert!(registry.with_session("a", |s| s.take_scroll()).is_some());
        assert!(registry.with_session("a", |s| s.take_scroll()).is_none());
    }

    #[test]
    fn generated_ids_validate() {
        let id = generate_session_id();
        assert!(is_valid_session_id(&id));
        assert!(!is_valid_session_id("../../etc/passwd"));
        assert!(!is_valid_session_id("short"));
    }
}
