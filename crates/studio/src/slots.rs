//! Generation slots.
//!
//! A batch is four independent calls to the generator with the same input;
//! each call owns one slot and only ever writes to that slot. Calls are
//! spawned and never cancelled. When a result arrives for a slot that was
//! discarded by a newer batch, or for an attempt superseded by a later
//! redo of the same slot, it is dropped.

use futures::future::join_all;
use parking_lot::Mutex;
use shared::events::SlotEvent;
use shared::generation::{GenerationError, GenerationRequest, MockupGenerator};
use shared::mockup::{Category, GenerationSlot, ImageUpload, SlotStatus, BATCH_SIZE};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Error text for a slot whose image arrived but could not be displayed
pub const RENDER_FAILURE_MESSAGE: &str = "Failed to render the generated image.";

/// Current user input: loaded image, category and description
#[derive(Debug, Clone, Default)]
pub struct GenerationForm {
    pub upload: Option<ImageUpload>,
    pub category: Category,
    pub description: String,
}

impl GenerationForm {
    fn request(&self) -> Option<GenerationRequest> {
        self.upload
            .as_ref()
            .map(|upload| GenerationRequest::new(upload, self.category, self.description.clone()))
    }
}

struct SlotEntry {
    slot: GenerationSlot,
    /// Bumped on every (re)start; only the latest attempt may write
    attempt: u64,
}

#[derive(Default)]
struct StudioState {
    form: GenerationForm,
    slots: Vec<SlotEntry>,
}

/// Handles to the calls of one batch
pub struct DispatchedBatch {
    pub slot_ids: Vec<String>,
    handles: Vec<JoinHandle<()>>,
}

impl DispatchedBatch {
    /// Wait until every call of the batch has completed
    pub async fn wait(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Generation task panicked");
            }
        }
    }
}

pub struct SlotManager {
    generator: Arc<dyn MockupGenerator>,
    state: Arc<Mutex<StudioState>>,
    events: broadcast::Sender<SlotEvent>,
}

impl SlotManager {
    pub fn new(generator: Arc<dyn MockupGenerator>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            generator,
            state: Arc::new(Mutex::new(StudioState::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SlotEvent> {
        self.events.subscribe()
    }

    pub fn load_image(&self, upload: ImageUpload) {
        self.state.lock().form.upload = Some(upload);
    }

    pub fn set_category(&self, category: Category) {
        self.state.lock().form.category = category;
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.state.lock().form.description = description.into();
    }

    pub fn form(&self) -> GenerationForm {
        self.state.lock().form.clone()
    }

    /// Snapshot of the active batch, in display order
    pub fn slots(&self) -> Vec<GenerationSlot> {
        self.state.lock().slots.iter().map(|e| e.slot.clone()).collect()
    }

    pub fn slot(&self, slot_id: &str) -> Option<GenerationSlot> {
        self.state
            .lock()
            .slots
            .iter()
            .find(|e| e.slot.id() == slot_id)
            .map(|e| e.slot.clone())
    }

    /// True while any slot of the active batch is loading
    pub fn any_loading(&self) -> bool {
        self.state.lock().slots.iter().any(|e| e.slot.is_loading())
    }

    /// Replace the active batch with four loading slots and start one call
    /// per slot. Returns `None` when no image is loaded.
    ///
    /// Once dispatched, the category goes back to the default and the
    /// description is cleared.
    pub fn start_generation(&self) -> Option<DispatchedBatch> {
        let (request, slot_ids) = {
            let mut state = self.state.lock();
            let request = state.form.request()?;
            state.slots = (0..BATCH_SIZE)
                .map(|_| SlotEntry {
                    slot: GenerationSlot::loading(),
                    attempt: 0,
                })
                .collect();
            let slot_ids: Vec<String> = state.slots.iter().map(|e| e.slot.id().to_string()).collect();
            (request, slot_ids)
        };

        tracing::info!(
            category = %request.category,
            slots = slot_ids.len(),
            "Starting mockup generation batch"
        );
        let _ = self.events.send(SlotEvent::BatchStarted {
            slot_ids: slot_ids.clone(),
        });

        let handles = slot_ids
            .iter()
            .map(|id| self.spawn_attempt(id.clone(), 0, request.clone()))
            .collect();

        {
            let mut state = self.state.lock();
            state.form.category = Category::default();
            state.form.description.clear();
        }

        Some(DispatchedBatch { slot_ids, handles })
    }

    /// Regenerate one slot with the current form input. The slot keeps its
    /// previous image while loading. Returns `None` when no image is loaded
    /// or the slot is not in the active batch.
    pub fn redo(&self, slot_id: &str) -> Option<JoinHandle<()>> {
        let (request, attempt) = {
            let mut state = self.state.lock();
            let request = state.form.request()?;
            let entry = state.slots.iter_mut().find(|e| e.slot.id() == slot_id)?;
            entry.attempt += 1;
            entry.slot.begin_redo();
            (request, entry.attempt)
        };

        tracing::debug!(slot_id, attempt, "Redoing slot");
        let _ = self.events.send(SlotEvent::SlotLoading {
            slot_id: slot_id.to_string(),
        });
        Some(self.spawn_attempt(slot_id.to_string(), attempt, request))
    }

    /// The slot's image could not be displayed; surface it as a failure so it
    /// can be redone and is not offered for saving. Only finished slots are
    /// affected; a failed slot keeps its generation error.
    pub fn report_render_failure(&self, slot_id: &str) -> bool {
        let failed = {
            let mut state = self.state.lock();
            match state.slots.iter_mut().find(|e| e.slot.id() == slot_id) {
                Some(entry) if entry.slot.status() == SlotStatus::Succeeded => {
                    entry.slot.fail(RENDER_FAILURE_MESSAGE.to_string());
                    true
                }
                _ => false,
            }
        };
        if failed {
            tracing::warn!(slot_id, "Generated image failed to render");
            let _ = self.events.send(SlotEvent::SlotFailed {
                slot_id: slot_id.to_string(),
                error: RENDER_FAILURE_MESSAGE.to_string(),
            });
        }
        failed
    }

    fn spawn_attempt(
        &self,
        slot_id: String,
        attempt: u64,
        request: GenerationRequest,
    ) -> JoinHandle<()> {
        let generator = Arc::clone(&self.generator);
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = generator.generate(request).await;
            let event = apply_outcome(&state, &slot_id, attempt, outcome);
            let _ = events.send(event);
        })
    }
}

/// Write a finished call into its slot, unless the slot is gone or a newer
/// attempt has started since.
fn apply_outcome(
    state: &Mutex<StudioState>,
    slot_id: &str,
    attempt: u64,
    outcome: Result<String, GenerationError>,
) -> SlotEvent {
    let mut state = state.lock();
    let entry = match state.slots.iter_mut().find(|e| e.slot.id() == slot_id) {
        Some(entry) if entry.attempt == attempt => entry,
        _ => {
            tracing::debug!(slot_id, attempt, "Dropping result for a discarded or superseded attempt");
            return SlotEvent::StaleResultDropped {
                slot_id: slot_id.to_string(),
            };
        }
    };

    match outcome {
        Ok(artifact) => {
            entry.slot.succeed(artifact);
            tracing::debug!(slot_id, "Slot succeeded");
            SlotEvent::SlotSucceeded {
                slot_id: slot_id.to_string(),
            }
        }
        Err(e) => {
            let error = e.to_string();
            entry.slot.fail(error.clone());
            tracing::debug!(slot_id, error = %error, "Slot failed");
            SlotEvent::SlotFailed {
                slot_id: slot_id.to_string(),
                error,
            }
        }
    }
}
