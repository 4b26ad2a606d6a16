//! Mockup generation prompt.
//!
//! The model tends to refuse when the upload does not look like a logo, so the
//! prompt insists on applying the image as a flat decal whatever it depicts.

use shared::mockup::Category;

/// Style used when the user leaves the description blank
pub const DEFAULT_STYLE: &str =
    "Clean, minimal, high-end studio lighting, photorealistic, neutral background.";

/// Build the full prompt for a category and optional description
pub fn build_mockup_prompt(category: Category, description: &str) -> String {
    let target = category.prompt_subject();
    let style = if description.trim().is_empty() {
        DEFAULT_STYLE
    } else {
        description
    };

    format!(
        r#"ROLE: Professional Mockup Generator.
TASK: Create a photorealistic product mockup of a {target}.

CRITICAL INSTRUCTION:
1. You are provided with an input image. You MUST use this exact image as the DESIGN/PRINT applied to the {target}.
2. IGNORE the subject matter of the input image. Whether it is a photo of an animal, a landscape, a person, or text, treat it strictly as a FLAT VISUAL TEXTURE/DECAL.
3. Do NOT refuse to generate because the image "doesn't look like a logo" or "doesn't fit the context". Your job is to force apply it.
4. If the input is a rectangular photo, wrap it or place it on the surface naturally.

STYLE/CONTEXT: {style}

OUTPUT: A single high-quality image of the {target} with the provided image applied to its main surface."#
    )
}
