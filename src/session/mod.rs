//! Editor session management module
//!
//! This module contains:
//! - The editor state store with transient and commit setters (store.rs)
//! - Bounded undo/redo history (history.rs)
//! - Message types for editor interactions (messages.rs)
//! - Keyboard shortcut bindings (shortcuts.rs)
//! - Session glue between store, canvas and render pipeline (editor.rs)

pub mod editor;
pub mod history;
pub mod messages;
pub mod shortcuts;
pub mod store;

pub use editor::{Collaborators, EditorSession, Outcome};
pub use messages::{Msg, Mutation};
pub use store::EditorStore;
