//! Generation workflow for the mockup studio: result slots, failure
//! suggestions and the two-step delete confirmation for saved items.

pub mod delete_gate;
pub mod slots;
pub mod suggestions;

pub use delete_gate::{DeleteGates, DeleteRequest, GateState, CONFIRM_WINDOW};
pub use slots::{DispatchedBatch, GenerationForm, SlotManager, RENDER_FAILURE_MESSAGE};
pub use suggestions::{suggest_fix, suggestion_for};
