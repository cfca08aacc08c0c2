//! Two-slot image mashup engine: ingest a character and a product image,
//! ask a generation service for one composite, and track what the UI shows.

pub mod config;
pub mod controller;
pub mod error;
pub mod ingest;
pub mod requester;
pub mod slot;
pub mod view;

pub use config::RequesterConfig;
pub use controller::{AppController, DisplayState, GenerationJob};
pub use error::{DownloadError, GenerationError, ReadError};
pub use ingest::{ingest, SelectedFile};
pub use requester::{
    default_registry, DryrunRequester, GeminiRequester, GenerationRequester, RequesterRegistry,
};
pub use slot::{FilePicker, SlotChange, UploadSlot};
pub use view::{AppView, OutputPanel, SlotView};
