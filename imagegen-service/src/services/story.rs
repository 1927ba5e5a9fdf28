//! Sequence orchestrator.
//!
//! Drives N sequential single-shot generations to build a narrative or
//! tutorial image set. Steps run strictly in index order, one finishing
//! before the next starts; the backend is never shown prior images, only the
//! position-aware prompt.

use crate::services::gateway::{BackendGateway, TOKENS_PER_CALL};
use crate::services::normalize;
use chrono::{DateTime, Utc};
use image::RgbImage;
use service_core::error::AppError;
use std::time::Instant;

/// One step's output within a sequence run. Ordering is generation order.
#[derive(Debug)]
pub struct SequenceItem {
    pub image: RgbImage,
    pub sequence_number: u32,
    pub caption: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SequenceOutcome {
    pub items: Vec<SequenceItem>,
    pub steps_issued: u32,
    pub total_token_estimate: i64,
    pub elapsed_seconds: f64,
}

/// Run `count` sequential generations. A step whose result carries no image
/// is skipped without error; any backend failure aborts the whole run with no
/// partial result.
pub async fn generate_sequence(
    gateway: &BackendGateway,
    description: &str,
    count: u32,
    style: Option<&str>,
    model: &str,
) -> Result<SequenceOutcome, AppError> {
    let started = Instant::now();
    let mut items = Vec::with_capacity(count as usize);
    let mut total_token_estimate: i64 = 0;

    for index in 1..=count {
        let request = normalize::story_step(description, index, count, style, model);
        let result = gateway.call(&request).await?;
        total_token_estimate += i64::from(result.token_estimate.total);

        let caption = result
            .text_fragments
            .first()
            .cloned()
            .unwrap_or_else(|| format!("Scene {}", index));

        match result.images.into_iter().next() {
            Some(image) => items.push(SequenceItem {
                image,
                sequence_number: index,
                caption,
                timestamp: Utc::now(),
            }),
            None => {
                tracing::warn!(step = index, count, "Sequence step produced no image; skipped");
            }
        }
    }

    Ok(SequenceOutcome {
        items,
        steps_issued: count,
        total_token_estimate,
        elapsed_seconds: started.elapsed().as_secs_f64(),
    })
}
