/// Selection Controller state cell
use crate::types::Selection;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared cell holding the active conversation's identity pair.
///
/// Written synchronously on selection change and read fresh inside every
/// event handler invocation, so a handler registered before a selection
/// change still attributes events to the current selection, not a
/// closure-captured one.
#[derive(Clone, Default)]
pub struct SelectionCell {
    inner: Arc<RwLock<Option<Selection>>>,
}

impl SelectionCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, selection: Option<Selection>) {
        *self.inner.write().await = selection;
    }

    pub async fn get(&self) -> Option<Selection> {
        self.inner.read().await.clone()
    }

    pub async fn is_selected(&self, chat_id: &str) -> bool {
        self.inner
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.chat_id == chat_id)
    }
}
