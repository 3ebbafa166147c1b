/// Conversation Directory: the authoritative, ordered conversation list
///
/// Ordering is most-recently-active-first. Snapshots from a full refresh go
/// through normalization and a deterministic de-duplication pass before they
/// replace the directory.
use crate::identity::phone_from_chat_id;
use crate::types::{Conversation, STATUS_BROADCAST};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<Conversation>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the directory with a normalized, de-duplicated snapshot
    pub fn replace(&mut self, records: Vec<Conversation>) {
        self.entries = dedupe(normalize(records));
    }

    pub fn entries(&self) -> &[Conversation] {
        &self.entries
    }

    pub fn index_of(&self, chat_id: &str) -> Option<usize> {
        self.entries.iter().position(|c| c.chat_id == chat_id)
    }

    pub fn get(&self, chat_id: &str) -> Option<&Conversation> {
        self.entries.iter().find(|c| c.chat_id == chat_id)
    }

    pub fn get_mut(&mut self, chat_id: &str) -> Option<&mut Conversation> {
        self.entries.iter_mut().find(|c| c.chat_id == chat_id)
    }

    pub fn at_mut(&mut self, idx: usize) -> &mut Conversation {
        &mut self.entries[idx]
    }

    /// Move the entry at `idx` to the head (most recently active)
    pub fn promote(&mut self, idx: usize) {
        if idx > 0 && idx < self.entries.len() {
            let entry = self.entries.remove(idx);
            self.entries.insert(0, entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fill in contact numbers missing from raw snapshot records: explicit field
/// first, else the non-suffix portion of the channel id (1:1 chats only)
pub fn normalize(mut records: Vec<Conversation>) -> Vec<Conversation> {
    for c in &mut records {
        if c.phone.is_none() && !c.is_group && !c.is_broadcast() {
            c.phone = phone_from_chat_id(&c.chat_id);
        }
    }
    records
}

/// Deterministic single-pass snapshot de-duplication.
///
/// Records are sorted descending by last-message timestamp and walked once
/// with two seen-sets. Groups and broadcasts dedupe by channel id only (the
/// reserved status broadcast is always dropped); 1:1 records are dropped when
/// either their channel id or their contact number was already seen. A
/// contact reachable under two addressing schemes therefore keeps exactly its
/// most-recently-active conversation. Re-running the pass on its own output
/// is a no-op.
pub fn dedupe(mut records: Vec<Conversation>) -> Vec<Conversation> {
    records.sort_by(|a, b| b.last_timestamp.cmp(&a.last_timestamp));

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_phones: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(records.len());

    for c in records {
        if c.chat_id == STATUS_BROADCAST {
            continue;
        }
        if c.is_group || c.is_broadcast() {
            if seen_ids.insert(c.chat_id.clone()) {
                out.push(c);
            }
            continue;
        }
        if seen_ids.contains(&c.chat_id) {
            continue;
        }
        if let Some(phone) = &c.phone {
            if seen_phones.contains(phone) {
                continue;
            }
        }
        seen_ids.insert(c.chat_id.clone());
        if let Some(phone) = &c.phone {
            seen_phones.insert(phone.clone());
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(chat_id: &str, phone: Option<&str>, ts: i64) -> Conversation {
        Conversation {
            chat_id: chat_id.to_string(),
            phone: phone.map(|p| p.to_string()),
            name: chat_id.to_string(),
            last_message: String::new(),
            last_timestamp: ts,
            unread: 0,
            archived: false,
            is_group: false,
            ai_enabled: false,
            sentiment: None,
            summary: None,
            suggestions: Vec::new(),
        }
    }

    fn group(chat_id: &str, ts: i64) -> Conversation {
        Conversation {
            is_group: true,
            phone: None,
            ..conv(chat_id, None, ts)
        }
    }

    #[test]
    fn test_latest_wins_for_shared_number() {
        // Same human under two addressing schemes; B is more recent
        let a = conv("id1@c.us", Some("+100"), 10);
        let b = conv("id2@s.net", Some("+100"), 20);
        let out = dedupe(vec![a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chat_id, "id2@s.net");
    }

    #[test]
    fn test_idempotent() {
        let records = vec![
            conv("id1@c.us", Some("+100"), 10),
            conv("id2@s.net", Some("+100"), 20),
            group("team@g.us", 15),
            conv("id3@c.us", Some("+200"), 5),
        ];
        let once = dedupe(records);
        let twice = dedupe(once.clone());
        let ids: Vec<_> = once.iter().map(|c| c.chat_id.clone()).collect();
        let ids2: Vec<_> = twice.iter().map(|c| c.chat_id.clone()).collect();
        assert_eq!(ids, ids2);
    }

    #[test]
    fn test_status_broadcast_dropped() {
        let out = dedupe(vec![
            conv(STATUS_BROADCAST, None, 99),
            conv("id1@c.us", None, 1),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chat_id, "id1@c.us");
    }

    #[test]
    fn test_groups_never_merged_by_number() {
        // Two groups that happen to carry the same number field dedupe only
        // by channel id
        let mut g1 = group("team1@g.us", 10);
        let mut g2 = group("team2@g.us", 5);
        g1.phone = Some("+100".to_string());
        g2.phone = Some("+100".to_string());
        let out = dedupe(vec![g1, g2]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_normalize_derives_phone() {
        let out = normalize(vec![conv("4915550001@c.us", None, 1), group("team@g.us", 2)]);
        assert_eq!(out[0].phone.as_deref(), Some("4915550001"));
        assert_eq!(out[1].phone, None);
    }

    #[test]
    fn test_replace_sorts_descending() {
        let mut dir = Directory::new();
        dir.replace(vec![
            conv("old@c.us", None, 1),
            conv("new@c.us", None, 9),
            conv("mid@c.us", None, 5),
        ]);
        let ids: Vec<_> = dir.entries().iter().map(|c| c.chat_id.as_str()).collect();
        assert_eq!(ids, vec!["new@c.us", "mid@c.us", "old@c.us"]);
    }

    #[test]
    fn test_promote() {
        let mut dir = Directory::new();
        dir.replace(vec![conv("a@c.us", None, 3), conv("b@c.us", None, 2)]);
        let idx = dir.index_of("b@c.us").unwrap();
        dir.promote(idx);
        assert_eq!(dir.entries()[0].chat_id, "b@c.us");
    }
}
