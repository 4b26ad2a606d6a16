//! Two-step delete for saved mockups.
//!
//! The first request arms the item's gate for [`CONFIRM_WINDOW`]; a second
//! request inside the window deletes. The window lapses on its own, or early
//! when the pointer leaves the item. Gates are independent per item.

use parking_lot::Mutex;
use services::{GalleryController, GalleryError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;

pub const CONFIRM_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    PendingConfirm,
}

/// What a delete request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRequest {
    /// First request: waiting for the confirming one
    AwaitingConfirmation,
    /// Second request inside the window: go ahead and delete
    Confirmed,
}

struct Pending {
    token: u64,
    deadline: Instant,
    expiry: AbortHandle,
}

type PendingMap = Arc<Mutex<HashMap<String, Pending>>>;

pub struct DeleteGates {
    pending: PendingMap,
    next_token: AtomicU64,
    window: Duration,
}

impl Default for DeleteGates {
    fn default() -> Self {
        Self::new()
    }
}

impl DeleteGates {
    pub fn new() -> Self {
        Self::with_window(CONFIRM_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_token: AtomicU64::new(0),
            window,
        }
    }

    pub fn state(&self, id: &str) -> GateState {
        match self.pending.lock().get(id) {
            Some(p) if Instant::now() < p.deadline => GateState::PendingConfirm,
            _ => GateState::Idle,
        }
    }

    /// Register a delete click. Must be called inside a tokio runtime (the
    /// expiry runs as a timer task).
    pub fn request_delete(&self, id: &str) -> DeleteRequest {
        let mut pending = self.pending.lock();
        if let Some(p) = pending.remove(id) {
            p.expiry.abort();
            if Instant::now() < p.deadline {
                return DeleteRequest::Confirmed;
            }
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + self.window;
        let expiry = spawn_expiry(Arc::clone(&self.pending), id.to_string(), token, deadline);
        pending.insert(
            id.to_string(),
            Pending {
                token,
                deadline,
                expiry,
            },
        );
        DeleteRequest::AwaitingConfirmation
    }

    /// Pointer left the item: disarm without deleting
    pub fn pointer_left(&self, id: &str) {
        if let Some(p) = self.pending.lock().remove(id) {
            p.expiry.abort();
        }
    }

    /// Run a delete click against the gallery. The item is removed only on
    /// the confirming click.
    pub async fn request_gallery_delete(
        &self,
        gallery: &GalleryController,
        id: &str,
    ) -> Result<DeleteRequest, GalleryError> {
        let request = self.request_delete(id);
        if request == DeleteRequest::Confirmed {
            gallery.unsave(id).await?;
            tracing::info!(id, "Deleted saved mockup");
        }
        Ok(request)
    }
}

fn spawn_expiry(pending: PendingMap, id: String, token: u64, deadline: Instant) -> AbortHandle {
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        let mut pending = pending.lock();
        if pending.get(&id).map(|p| p.token) == Some(token) {
            pending.remove(&id);
            tracing::debug!(id = %id, "Delete confirmation expired");
        }
    })
    .abort_handle()
}
