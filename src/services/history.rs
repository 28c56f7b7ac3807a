use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::models::{GeneratedImage, SizePreset, Style};
use crate::services::vendors::Generation;

/// Generated images, most recent first, bounded by `capacity`.
pub struct GenerationHistory {
    entries: RwLock<VecDeque<GeneratedImage>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl GenerationHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            capacity,
        }
    }

    /// Store a generation result and return the recorded entry
    pub async fn record(
        &self,
        generation: &Generation,
        original_prompt: &str,
        style: Style,
        size: SizePreset,
    ) -> GeneratedImage {
        let image = GeneratedImage {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            url: generation.url.clone(),
            prompt: generation.prompt.clone(),
            original_prompt: original_prompt.trim().to_string(),
            style,
            size,
            created_at: chrono::Utc::now(),
        };

        if self.capacity == 0 {
            return image;
        }

        let mut entries = self.entries.write().await;
        entries.push_front(image.clone());
        while entries.len() > self.capacity {
            if let Some(evicted) = entries.pop_back() {
                tracing::debug!(id = evicted.id, "History full, dropped oldest entry");
            }
        }
        image
    }

    pub async fn list(&self) -> Vec<GeneratedImage> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn get(&self, id: u64) -> Option<GeneratedImage> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    /// Remove every entry and return how many were dropped
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let cleared = entries.len();
        entries.clear();
        cleared
    }
}
