//! Gallery of saved mockups.
//!
//! Wraps a [`MockupStore`] with the gallery rules: a hard cap of
//! [`MAX_SAVED_ITEMS`] checked at save time (no eviction), upsert by id, and
//! removal of records whose image no longer renders. The cached listing only
//! changes after the store call succeeded, so a failed write leaves the view
//! as it was.

use parking_lot::RwLock;
use shared::events::GalleryEvent;
use shared::mockup::{GenerationSlot, SavedMockup, SlotStatus, MAX_SAVED_ITEMS};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::image_data::{self, ImageDataError};
use crate::mockup_store::{MockupStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("Your gallery is full ({limit}/{limit}). Delete some old images to save new ones.")]
    CapacityReached { limit: usize },

    #[error("Mockup {id} has no finished image to save")]
    NoArtifact { id: String },

    #[error("Mockup {id} could not be rendered")]
    Unrenderable { id: String },

    #[error("Mockup {id} is not in the gallery")]
    NotFound { id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    ImageData(#[from] ImageDataError),
}

pub struct GalleryController {
    store: Arc<dyn MockupStore>,
    items: RwLock<Vec<SavedMockup>>,
    events: broadcast::Sender<GalleryEvent>,
    /// Serialises store writes so the capacity check and the put are atomic
    write_lock: Mutex<()>,
}

impl GalleryController {
    /// Create the controller and load the current listing
    pub async fn open(store: Arc<dyn MockupStore>) -> Result<Self, StoreError> {
        let (events, _) = broadcast::channel(64);
        let gallery = Self {
            store,
            items: RwLock::new(Vec::new()),
            events,
            write_lock: Mutex::new(()),
        };
        gallery.refresh().await?;
        Ok(gallery)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.events.subscribe()
    }

    /// Cached listing, newest first
    pub fn items(&self) -> Vec<SavedMockup> {
        self.items.read().clone()
    }

    pub fn count(&self) -> usize {
        self.items.read().len()
    }

    pub fn capacity(&self) -> usize {
        MAX_SAVED_ITEMS
    }

    pub fn is_full(&self) -> bool {
        self.count() >= MAX_SAVED_ITEMS
    }

    /// Re-read the listing from the store
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let items = self.store.get_all().await?;
        *self.items.write() = items;
        Ok(())
    }

    /// Persist an image under `id`, replacing any record with that id.
    ///
    /// A new id is refused once the store holds [`MAX_SAVED_ITEMS`] records;
    /// replacing an existing id does not grow the store and is allowed.
    pub async fn save(&self, id: &str, image_ref: &str) -> Result<SavedMockup, GalleryError> {
        let _guard = self.write_lock.lock().await;
        let exists = self.store.get(id).await?.is_some();
        if !exists && self.store.count().await? >= MAX_SAVED_ITEMS {
            tracing::info!(id, "Save refused: gallery is full");
            return Err(GalleryError::CapacityReached {
                limit: MAX_SAVED_ITEMS,
            });
        }

        let mockup = SavedMockup::new(id, image_ref);
        if let Err(e) = self.store.put(&mockup).await {
            tracing::error!(id, error = %e, "Failed to save mockup");
            return Err(e.into());
        }

        {
            let mut items = self.items.write();
            match items.iter_mut().find(|m| m.id == id) {
                Some(existing) => *existing = mockup.clone(),
                None => items.insert(0, mockup.clone()),
            }
        }
        let _ = self.events.send(GalleryEvent::Saved { id: id.to_string() });
        Ok(mockup)
    }

    /// Save a finished slot under the slot's own id
    pub async fn save_slot(&self, slot: &GenerationSlot) -> Result<SavedMockup, GalleryError> {
        let artifact = match (slot.status(), slot.artifact()) {
            (SlotStatus::Succeeded, Some(artifact)) => artifact,
            _ => {
                return Err(GalleryError::NoArtifact {
                    id: slot.id().to_string(),
                })
            }
        };
        if !self.renders(artifact).await {
            return Err(GalleryError::Unrenderable {
                id: slot.id().to_string(),
            });
        }
        self.save(slot.id(), artifact).await
    }

    /// Remove by id; unknown ids are fine
    pub async fn unsave(&self, id: &str) -> Result<(), GalleryError> {
        self.remove(id).await?;
        let _ = self.events.send(GalleryEvent::Removed { id: id.to_string() });
        Ok(())
    }

    /// Bookmark toggle for a result card. Returns whether the slot is saved
    /// afterwards.
    pub async fn toggle(&self, slot: &GenerationSlot) -> Result<bool, GalleryError> {
        if self.is_saved(slot.id()).await? {
            self.unsave(slot.id()).await?;
            Ok(false)
        } else {
            self.save_slot(slot).await?;
            Ok(true)
        }
    }

    /// Read-through existence check
    pub async fn is_saved(&self, id: &str) -> Result<bool, GalleryError> {
        Ok(self.store.get(id).await?.is_some())
    }

    /// A stored image failed to render: drop it without asking
    pub async fn report_corrupt(&self, id: &str) -> Result<(), GalleryError> {
        tracing::warn!(id, "Corrupted image detected, removing it from the gallery");
        self.remove(id).await?;
        let _ = self
            .events
            .send(GalleryEvent::CorruptRemoved { id: id.to_string() });
        Ok(())
    }

    /// Render-check one item, removing it when it fails. Returns whether the
    /// item is still in the gallery.
    pub async fn verify(&self, item: &SavedMockup) -> Result<bool, GalleryError> {
        if self.renders(&item.url).await {
            return Ok(true);
        }
        self.report_corrupt(&item.id).await?;
        Ok(false)
    }

    /// Verify every stored item; returns the ids that were removed
    pub async fn heal(&self) -> Result<Vec<String>, GalleryError> {
        let mut removed = Vec::new();
        for item in self.store.get_all().await? {
            if !self.verify(&item).await? {
                removed.push(item.id);
            }
        }
        Ok(removed)
    }

    /// Download a saved mockup into `dir`
    pub async fn export(&self, id: &str, dir: &Path) -> Result<PathBuf, GalleryError> {
        let item = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| GalleryError::NotFound { id: id.to_string() })?;
        Ok(image_data::export_to(&item.url, dir, &item.download_name())?)
    }

    async fn remove(&self, id: &str) -> Result<(), GalleryError> {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.store.delete(id).await {
            tracing::error!(id, error = %e, "Failed to delete mockup");
            return Err(e.into());
        }
        self.items.write().retain(|m| m.id != id);
        Ok(())
    }

    async fn renders(&self, image_ref: &str) -> bool {
        let image_ref = image_ref.to_string();
        match tokio::task::spawn_blocking(move || image_data::check_renderable(&image_ref)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Image failed the render check");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Render check task failed");
                false
            }
        }
    }
}
