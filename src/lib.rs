pub mod autosave;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod imaging;
pub mod library;
pub mod models;
pub mod rating;
pub mod session;
pub mod stickers;
pub mod store;

#[cfg(feature = "desktop")]
pub mod commands;

pub use autosave::AutosaveController;
pub use config::{EditorConfig, ImageTarget, JournalConfig, StickerConfig};
pub use editor::{BookEditor, EditorUi, EditorView};
pub use library::{browse, Library, LibraryItem, LibraryPage, LibraryQuery};
pub use models::{
  BookContent, BookFormat, BookRecord, Category, LongField, RatingKind, SaveStatus, Sticker,
  SubRatings, TextField,
};
pub use session::{EditorSession, SessionError};
pub use stickers::{BoardAction, GestureState, Handle, RemovalRequest, StickerBoard};
pub use store::{JsonFileStore, RecordStore, StoreError};
