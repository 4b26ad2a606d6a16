//! Mockup domain types: categories, uploads, generation slots and saved items.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of slots created per generation batch
pub const BATCH_SIZE: usize = 4;

/// Maximum number of mockups the gallery accepts
pub const MAX_SAVED_ITEMS: usize = 50;

/// Upload types accepted at the boundary
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif"];

/// Mockup category offered to the user.
///
/// The labels are the user-facing vocabulary and the subject phrases are the
/// contract with the generation model; both must stay verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Papelaria,
    Fachada,
    Embalagem,
    Camiseta,
    Mobile,
    Desktop,
    Tablet,
    Caneca,
    #[serde(rename = "Sacola (Tote Bag)")]
    SacolaToteBag,
    #[serde(rename = "Cartão de Visita")]
    CartaoDeVisita,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Papelaria,
            Category::Fachada,
            Category::Embalagem,
            Category::Camiseta,
            Category::Mobile,
            Category::Desktop,
            Category::Tablet,
            Category::Caneca,
            Category::SacolaToteBag,
            Category::CartaoDeVisita,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Papelaria => "Papelaria",
            Category::Fachada => "Fachada",
            Category::Embalagem => "Embalagem",
            Category::Camiseta => "Camiseta",
            Category::Mobile => "Mobile",
            Category::Desktop => "Desktop",
            Category::Tablet => "Tablet",
            Category::Caneca => "Caneca",
            Category::SacolaToteBag => "Sacola (Tote Bag)",
            Category::CartaoDeVisita => "Cartão de Visita",
        }
    }

    /// English subject phrase sent to the model for this category
    pub fn prompt_subject(&self) -> &'static str {
        match self {
            Category::Papelaria => "Stationery set (notebook, letterhead, envelope, pen)",
            Category::Fachada => "Storefront signage or building facade logo",
            Category::Embalagem => "Product packaging box or pouch",
            Category::Camiseta => "Cotton T-Shirt on a hanger or model",
            Category::Mobile => "Smartphone screen display (iPhone or Android)",
            Category::Desktop => "Desktop computer monitor workspace",
            Category::Tablet => "Tablet screen display (iPad)",
            Category::Caneca => "Ceramic coffee mug",
            Category::SacolaToteBag => "Canvas tote bag",
            Category::CartaoDeVisita => "Business card stack",
        }
    }

    /// Case-insensitive lookup by label
    pub fn from_label(label: &str) -> Option<Category> {
        let wanted = label.trim().to_lowercase();
        Category::all()
            .iter()
            .copied()
            .find(|c| c.label().to_lowercase() == wanted)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Upload rejected before it reaches the generation core
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Unsupported file type {mime_type}: only PNG, JPG or GIF images are accepted")]
    UnsupportedMimeType { mime_type: String },

    #[error("The image is empty")]
    EmptyImage,

    #[error("Not a base64 data URI")]
    MalformedDataUri,
}

pub fn validate_mime_type(mime_type: &str) -> Result<(), UploadError> {
    let normalized = mime_type.trim().to_ascii_lowercase();
    if ALLOWED_MIME_TYPES.contains(&normalized.as_str()) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedMimeType {
            mime_type: mime_type.to_string(),
        })
    }
}

/// Returns the payload of a `data:` URI, or the input when there is no prefix.
pub fn strip_data_uri_prefix(image: &str) -> &str {
    match image.split_once(',') {
        Some((_, payload)) if !payload.is_empty() => payload,
        _ => image,
    }
}

/// An image the user loaded, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    mime_type: String,
    base64: String,
}

impl ImageUpload {
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Result<Self, UploadError> {
        validate_mime_type(mime_type)?;
        if bytes.is_empty() {
            return Err(UploadError::EmptyImage);
        }
        Ok(Self {
            mime_type: mime_type.trim().to_ascii_lowercase(),
            base64: BASE64.encode(bytes),
        })
    }

    /// Accepts `data:<mime>;base64,<payload>` as produced by a file reader.
    pub fn from_data_uri(uri: &str) -> Result<Self, UploadError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or(UploadError::MalformedDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(UploadError::MalformedDataUri)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(UploadError::MalformedDataUri)?;
        validate_mime_type(mime_type)?;
        if payload.is_empty() {
            return Err(UploadError::EmptyImage);
        }
        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            base64: payload.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn base64_payload(&self) -> &str {
        &self.base64
    }

    pub fn preview(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Derived state of a generation slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    Loading,
    Succeeded,
    Failed,
}

/// One of the concurrent generation attempts of a batch.
///
/// Fields are private so the only reachable states are: loading with no
/// error, succeeded with an artifact, or failed with an error (and possibly
/// the artifact of an earlier attempt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSlot {
    id: String,
    status: SlotStatus,
    artifact: Option<String>,
    error: Option<String>,
}

impl GenerationSlot {
    pub fn loading() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: SlotStatus::Loading,
            artifact: None,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == SlotStatus::Loading
    }

    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Back to loading for a redo. The previous artifact stays visible until
    /// the new attempt replaces it.
    pub fn begin_redo(&mut self) {
        self.status = SlotStatus::Loading;
        self.error = None;
    }

    pub fn succeed(&mut self, artifact: String) {
        self.status = SlotStatus::Succeeded;
        self.artifact = Some(artifact);
        self.error = None;
    }

    pub fn fail(&mut self, message: String) {
        self.status = SlotStatus::Failed;
        self.error = Some(message);
    }

    /// Name used when the artifact is downloaded
    pub fn download_name(&self) -> String {
        format!("mockup-{}.png", self.id)
    }
}

/// A generated mockup persisted in the local gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMockup {
    pub id: String,
    pub url: String,
    /// ISO 8601, set when saved
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl SavedMockup {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn download_name(&self) -> String {
        format!("mockup-saved-{}.png", self.id)
    }
}
