//! Member-access completion for Java-family sources
//!
//! Given the text before the cursor, the engine resolves a dotted access chain such as
//! `list.get(0).` to the class it lands on and offers that class's members. Class
//! models are extracted heuristically from source text found under the project roots
//! or inside a toolchain's bundled source archive, and are cached per session.

pub mod completion;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod models;
pub mod parsers;
pub mod session;
pub mod text;

pub use completion::{CompletionItem, ImportCandidate, ItemKind};
pub use config::CompletionConfig;
pub use error::{CompletionError, Result};
pub use models::ClassModel;
pub use session::{CompletionSession, SharedSession};
