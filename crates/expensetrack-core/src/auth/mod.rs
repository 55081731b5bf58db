//! Authentication: session persistence and the session lifecycle.
//!
//! This module provides:
//! - `SessionStore`: key-value persistence for `userToken`, `userEmail`
//!   and `username`, with file, OS keychain and in-memory backends
//! - `Session`: typed access to the stored credential and identity
//! - `AuthFlow`: login/register/sign-out and the centralized handler for
//!   rejected credentials

pub mod flow;
pub mod keychain;
pub mod session;
pub mod store;

pub use flow::{AuthFlow, AuthState, Navigator};
pub use keychain::KeychainSessionStore;
pub use session::{Session, SessionData};
pub use store::{FileSessionStore, MemorySessionStore, SessionKey, SessionStore};
