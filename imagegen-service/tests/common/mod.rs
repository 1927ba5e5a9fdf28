//! Shared test harness: config fixture, stub backend fragments, and an
//! application spawned on a random port.

#![allow(dead_code)]

use imagegen_service::config::{
    GoogleConfig, ImagegenConfig, LimitsConfig, ModelConfig, SessionConfig,
};
use imagegen_service::media;
use imagegen_service::services::backend::{Fragment, ImageBackend};
use imagegen_service::startup::Application;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_MODEL: &str = "test-image-model";

pub fn test_config() -> ImagegenConfig {
    ImagegenConfig {
        common: service_core::config::Config { port: 0 },
        google: GoogleConfig {
            api_key: TEST_API_KEY.to_string(),
        },
        models: ModelConfig {
            image_model: TEST_MODEL.to_string(),
        },
        limits: LimitsConfig {
            max_upload_bytes: 20 * 1024 * 1024,
            max_prompt_chars: 2000,
            min_story_images: 2,
            max_story_images: 15,
        },
        sessions: SessionConfig {
            idle_timeout_secs: None,
        },
    }
}

/// 2x2 fully red PNG.
pub fn red_square_png() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 0]));
    media::encode_png(&image).expect("Failed to encode test PNG")
}

/// One text fragment "ok" plus one 2x2 red image fragment.
pub fn ok_fragments() -> Vec<Fragment> {
    vec![
        Fragment::Text("ok".to_string()),
        Fragment::Inline {
            mime_type: "image/png".to_string(),
            data: red_square_png(),
        },
    ]
}

/// Spawn the application against the given backend and return the port.
pub async fn spawn_app(backend: Arc<dyn ImageBackend>) -> u16 {
    let app = Application::build_with_backend(test_config(), backend)
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    // Wait for the server to start.
    tokio::time::sleep(Duration::from_millis(100)).await;

    port
}

pub fn decode_base64_image(data: &str) -> image::RgbImage {
    media::from_base64(data).expect("Failed to decode base64 image from response")
}
