//! Session persistence.
//!
//! A session file is a single JSON document holding a format version, the
//! time it was written, and the ordered conversation history.

pub mod store;

pub use store::{load_session, save_session, SessionDocument, SessionError, SESSION_FORMAT_VERSION};
