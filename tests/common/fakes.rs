//! In-process stand-ins for vendor adapters.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use imgkit::error::VendorError;
use imgkit::services::{Generation, GenerationRequest, ImageGenerator};

/// Generator that counts its calls and always succeeds
#[derive(Default)]
pub struct CountingGenerator {
    calls: AtomicUsize,
}

impl CountingGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for CountingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, VendorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Generation {
            url: format!("https://cdn.example.com/generated/{n}.jpeg"),
            prompt: request.style.enhance(&request.prompt),
            usage: None,
        })
    }
}
