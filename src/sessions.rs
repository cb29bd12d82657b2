//! Per-session prompt injection bookkeeping.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Prompt names in injection order, without duplicates.
    pub injected_prompts: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        let map = self.sessions.read().unwrap_or_else(|p| p.into_inner());
        map.get(id).cloned()
    }

    pub fn get_or_create(&self, id: &str) -> Session {
        if let Some(s) = self.get(id) {
            return s;
        }
        let mut map = self.sessions.write().unwrap_or_else(|p| p.into_inner());
        map.entry(id.to_string())
            .or_insert_with(|| Session {
                id: id.to_string(),
                created_at: Utc::now(),
                injected_prompts: Vec::new(),
            })
            .clone()
    }

    /// Record `prompt` for session `id`, creating the session if needed.
    /// Returns `false` if it was already injected.
    pub fn inject(&self, id: &str, prompt: &str) -> bool {
        let mut map = self.sessions.write().unwrap_or_else(|p| p.into_inner());
        let session = map.entry(id.to_string()).or_insert_with(|| Session {
            id: id.to_string(),
            created_at: Utc::now(),
            injected_prompts: Vec::new(),
        });
        if session.injected_prompts.iter().any(|p| p == prompt) {
            return false;
        }
        session.injected_prompts.push(prompt.to_string());
        true
    }

    pub fn remove(&self, id: &str) -> Option<Session> {
        let mut map = self.sessions.write().unwrap_or_else(|p| p.into_inner());
        map.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_is_idempotent_per_prompt() {
        let store = SessionStore::new();
        assert!(store.inject("s1", "xmlui_rules"));
        assert!(!store.inject("s1", "xmlui_rules"));
        assert!(store.inject("s1", "xmlui_component_author"));
        let s = store.get("s1").unwrap();
        assert_eq!(s.injected_prompts, vec!["xmlui_rules", "xmlui_component_author"]);
    }

    #[test]
    fn test_get_or_create_and_remove() {
        let store = SessionStore::new();
        assert!(store.get("x").is_none());
        let s = store.get_or_create("x");
        assert!(s.injected_prompts.is_empty());
        assert_eq!(store.len(), 1);
        assert!(store.remove("x").is_some());
        assert!(store.is_empty());
    }
}
