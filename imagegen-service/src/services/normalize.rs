//! Request normalizer.
//!
//! Maps every operation kind onto the canonical call shape
//! (instruction, attachments, model, options), applying the per-operation
//! instruction transforms. Structural requirements (attachment counts,
//! mutually required fields) are checked here before any backend call.

use crate::dtos::images::{CompositionStyle, Direction, StyleType};
use crate::services::backend::{GenerationOptions, GenerationRequest};
use image::RgbImage;
use service_core::error::AppError;
use std::fmt::Write as _;

/// generate: verbatim prompt, no attachments.
pub fn generate(prompt: &str, model: &str, options: GenerationOptions) -> GenerationRequest {
    GenerationRequest {
        instruction: prompt.to_string(),
        attachments: Vec::new(),
        model: model.to_string(),
        options,
    }
}

/// edit: optional subject-preservation clause, exactly one attachment.
pub fn edit(
    prompt: &str,
    preserve_subject: bool,
    image: RgbImage,
    model: &str,
) -> GenerationRequest {
    let instruction = if preserve_subject {
        format!("{}. Preserve the main subject exactly as it is.", prompt)
    } else {
        prompt.to_string()
    };

    GenerationRequest {
        instruction,
        attachments: vec![image],
        model: model.to_string(),
        options: GenerationOptions::default(),
    }
}

fn composition_clause(style: CompositionStyle) -> &'static str {
    match style {
        CompositionStyle::Blend => "seamlessly blend the elements together",
        CompositionStyle::Replace => "replace elements from one image with another",
        CompositionStyle::Overlay => "overlay elements maintaining distinct layers",
        CompositionStyle::Montage => "create an artistic montage composition",
    }
}

/// compose: style clause from a fixed lookup, at least two attachments.
pub fn compose(
    prompt: &str,
    style: CompositionStyle,
    images: Vec<RgbImage>,
    model: &str,
) -> Result<GenerationRequest, AppError> {
    if images.len() < 2 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Must provide at least 2 images"
        )));
    }

    Ok(GenerationRequest {
        instruction: format!("{}. {}.", prompt, composition_clause(style)),
        attachments: images,
        model: model.to_string(),
        options: GenerationOptions::default(),
    })
}

/// inpaint: rewrites the prompt around the described region, or a generic
/// modify-this-area framing when none is given.
pub fn inpaint(
    prompt: &str,
    region_description: Option<&str>,
    image: RgbImage,
    model: &str,
) -> GenerationRequest {
    let instruction = match region_description {
        Some(region) => format!("In the region described as '{}', {}", region, prompt),
        None => format!("Modify the specified area: {}", prompt),
    };

    GenerationRequest {
        instruction,
        attachments: vec![image],
        model: model.to_string(),
        options: GenerationOptions::default(),
    }
}

/// outpaint: names the requested direction set and extension ratio.
pub fn outpaint(
    prompt: &str,
    directions: &[Direction],
    extension_ratio: f32,
    image: RgbImage,
    model: &str,
) -> Result<GenerationRequest, AppError> {
    if directions.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "At least one direction is required"
        )));
    }

    let direction_text = directions
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let instruction = format!(
        "Extend this image in the {} direction(s) by {}x. {} Maintain visual consistency and style with the original image.",
        direction_text, extension_ratio, prompt
    );

    Ok(GenerationRequest {
        instruction,
        attachments: vec![image],
        model: model.to_string(),
        options: GenerationOptions::default(),
    })
}

fn style_description(style: StyleType) -> &'static str {
    match style {
        StyleType::VanGogh => {
            "Vincent van Gogh's post-impressionist style with bold brushstrokes and vibrant colors"
        }
        StyleType::Picasso => {
            "Pablo Picasso's cubist style with geometric forms and multiple perspectives"
        }
        StyleType::Monet => {
            "Claude Monet's impressionist style with soft brushwork and light effects"
        }
        StyleType::DigitalArt => "modern digital art style with clean lines and vibrant colors",
        StyleType::Anime => "Japanese anime/manga art style",
        StyleType::OilPainting => "classical oil painting technique",
        StyleType::Watercolor => "watercolor painting technique with soft, flowing colors",
        StyleType::Photographic => "photorealistic style",
        StyleType::Minimalist => "minimalist art style with simple forms and limited colors",
        StyleType::Abstract => "abstract art style with non-representational forms",
    }
}

/// style-transfer: a reference-image clause or a named-style clause; one of
/// the two must be supplied.
pub fn style_transfer(
    style: Option<StyleType>,
    reference: Option<RgbImage>,
    style_strength: f32,
    preserve_content: bool,
    image: RgbImage,
    model: &str,
) -> Result<GenerationRequest, AppError> {
    let mut attachments = vec![image];

    let mut instruction = match (&reference, style) {
        (Some(_), _) => format!(
            "Apply the artistic style from the second image to the first image with {} strength.",
            style_strength
        ),
        (None, Some(style)) => format!(
            "Apply {} to this image with {} strength.",
            style_description(style),
            style_strength
        ),
        (None, None) => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Must specify either style or style_reference_image"
            )));
        }
    };

    if let Some(reference) = reference {
        attachments.push(reference);
    }

    if preserve_content {
        instruction.push_str(" Preserve the original content structure and composition.");
    }

    Ok(GenerationRequest {
        instruction,
        attachments,
        model: model.to_string(),
        options: GenerationOptions::default(),
    })
}

/// chat message: raw text, optionally one attached image.
pub fn chat_message(message: &str, image: Option<RgbImage>, model: &str) -> GenerationRequest {
    GenerationRequest {
        instruction: message.to_string(),
        attachments: image.into_iter().collect(),
        model: model.to_string(),
        options: GenerationOptions::default(),
    }
}

/// Narrative-position hint for a 1-based sequence index.
pub fn narrative_position(index: u32, total: u32) -> &'static str {
    if index == 1 {
        "beginning"
    } else if index == total {
        "conclusion"
    } else {
        "middle"
    }
}

/// sequence step: positional instruction embedding the description, the
/// 1-based index, the total count, an optional style line, and the
/// narrative-position hint.
pub fn story_step(
    description: &str,
    index: u32,
    total: u32,
    style: Option<&str>,
    model: &str,
) -> GenerationRequest {
    let mut instruction = String::new();
    let _ = writeln!(instruction, "{}", description);
    let _ = writeln!(instruction);
    let _ = writeln!(
        instruction,
        "This is image {} of {} in the sequence.",
        index, total
    );
    if let Some(style) = style {
        let _ = writeln!(instruction, "Style: {}", style);
    }
    let _ = writeln!(instruction);
    let _ = write!(
        instruction,
        "Focus on the {} part of the story/sequence.",
        narrative_position(index, total)
    );

    GenerationRequest {
        instruction,
        attachments: Vec::new(),
        model: model.to_string(),
        options: GenerationOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn pixel() -> RgbImage {
        RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0]))
    }

    #[test]
    fn generate_passes_prompt_verbatim() {
        let request = generate("a red square", "m", GenerationOptions::default());
        assert_eq!(request.instruction, "a red square");
        assert!(request.attachments.is_empty());
    }

    #[test]
    fn edit_appends_preservation_clause_only_when_asked() {
        let preserved = edit("make it blue", true, pixel(), "m");
        assert_eq!(
            preserved.instruction,
            "make it blue. Preserve the main subject exactly as it is."
        );

        let plain = edit("make it blue", false, pixel(), "m");
        assert_eq!(plain.instruction, "make it blue");
    }

    #[test]
    fn compose_requires_two_images() {
        let err = compose("merge", CompositionStyle::Blend, vec![pixel()], "m").unwrap_err();
        assert!(matches!(
            err,
            service_core::error::AppError::BadRequest(_)
        ));

        let request =
            compose("merge", CompositionStyle::Blend, vec![pixel(), pixel()], "m").unwrap();
        assert_eq!(
            request.instruction,
            "merge. seamlessly blend the elements together."
        );
        assert_eq!(request.attachments.len(), 2);
    }

    #[test]
    fn inpaint_references_the_region_when_given() {
        let with_region = inpaint("add a bird", Some("the sky"), pixel(), "m");
        assert_eq!(
            with_region.instruction,
            "In the region described as 'the sky', add a bird"
        );

        let generic = inpaint("add a bird", None, pixel(), "m");
        assert_eq!(generic.instruction, "Modify the specified area: add a bird");
    }

    #[test]
    fn outpaint_names_directions_and_ratio() {
        let request = outpaint(
            "more forest",
            &[Direction::Left, Direction::Right],
            0.5,
            pixel(),
            "m",
        )
        .unwrap();
        assert!(request.instruction.contains("left, right"));
        assert!(request.instruction.contains("0.5x"));

        let err = outpaint("more forest", &[], 0.5, pixel(), "m").unwrap_err();
        assert!(matches!(
            err,
            service_core::error::AppError::BadRequest(_)
        ));
    }

    #[test]
    fn style_transfer_requires_style_or_reference() {
        let err = style_transfer(None, None, 0.8, true, pixel(), "m").unwrap_err();
        assert!(matches!(
            err,
            service_core::error::AppError::BadRequest(_)
        ));

        let named = style_transfer(Some(StyleType::VanGogh), None, 0.8, false, pixel(), "m")
            .unwrap();
        assert!(named.instruction.contains("van Gogh"));
        assert_eq!(named.attachments.len(), 1);

        let referenced = style_transfer(None, Some(pixel()), 0.8, true, pixel(), "m").unwrap();
        assert!(referenced
            .instruction
            .contains("style from the second image"));
        assert!(referenced.instruction.ends_with(
            "Preserve the original content structure and composition."
        ));
        assert_eq!(referenced.attachments.len(), 2);
    }

    #[test]
    fn story_steps_carry_positional_hints() {
        assert_eq!(narrative_position(1, 5), "beginning");
        assert_eq!(narrative_position(3, 5), "middle");
        assert_eq!(narrative_position(5, 5), "conclusion");

        let first = story_step("a fox's journey", 1, 5, Some("watercolor"), "m");
        assert!(first.instruction.contains("image 1 of 5"));
        assert!(first.instruction.contains("Style: watercolor"));
        assert!(first.instruction.contains("beginning"));

        let last = story_step("a fox's journey", 5, 5, None, "m");
        assert!(last.instruction.contains("conclusion"));
        assert!(!last.instruction.contains("Style:"));
    }
}
