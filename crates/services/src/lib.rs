pub mod gallery;
pub mod image_data;
pub mod mockup_store;

pub use gallery::{GalleryController, GalleryError};
pub use mockup_store::{MemoryMockupStore, MockupStore, SqliteMockupStore, StoreError};
