//! Content collaborator
//!
//! The fan-out core does not own content; the content-save collaborator
//! pushes items in and the dispatcher reads them back by id at fire time.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::PostContent;

/// Read/write seam for content items.
pub trait ContentStore: Send + Sync {
    fn get(&self, post_id: &str) -> Option<PostContent>;
    fn upsert(&self, content: PostContent);
    fn remove(&self, post_id: &str);
}

/// In-memory content store. Content lives only as long as the process;
/// the durable copy belongs to the host CMS.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    items: RwLock<HashMap<String, PostContent>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentStore for MemoryContentStore {
    fn get(&self, post_id: &str) -> Option<PostContent> {
        self.items
            .read()
            .expect("content store lock poisoned")
            .get(post_id)
            .cloned()
    }

    fn upsert(&self, content: PostContent) {
        self.items
            .write()
            .expect("content store lock poisoned")
            .insert(content.id.clone(), content);
    }

    fn remove(&self, post_id: &str) {
        self.items
            .write()
            .expect("content store lock poisoned")
            .remove(post_id);
    }
}
