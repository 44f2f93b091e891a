//! # mpconsole Core
//!
//! Client library for the subscription admin console backend.
//!
//! This crate provides:
//! - A session store holding the single bearer credential, in memory, on disk
//!   or (optionally) in the OS keyring
//! - A transport that attaches the credential and enforces a timeout
//! - An envelope interpreter turning `{code, data, message}` responses into
//!   payloads or classified errors, and clearing the session on expiry
//! - A navigation guard and navigator deciding whether protected routes may
//!   be entered and redirecting to login when they may not
//! - Typed bindings for the backend's user, subscription, article, config and
//!   message task endpoints
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mpconsole_core::{load_config, Console, Navigation};
//!
//! async fn open_configs() -> Result<(), mpconsole_core::ConsoleError> {
//!     let console = Console::from_config(load_config()?)?;
//!     console.login("admin", "secret").await?;
//!
//!     match console.navigator().navigate("/configs").await {
//!         Navigation::Entered { .. } => {
//!             let configs = console.client().list_configs(Default::default()).await?;
//!             println!("{} entries", configs.len());
//!         }
//!         other => println!("not entered: {:?}", other),
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod classify;
pub mod client;
pub mod config;
pub mod console;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod navigator;
pub mod request;
pub mod session;
pub mod transport;

// Re-export commonly used types at crate root
pub use client::ApiClient;

pub use console::Console;

pub use config::{
    load_config,
    load_config_from,
    ConsoleConfig,
};

pub use envelope::{
    DecodePolicy,
    Envelope,
    EnvelopeInterpreter,
};

pub use error::{
    ClassifiedError,
    ConfigError,
    ConsoleError,
    ErrorKind,
};

pub use guard::{
    NavigationGuard,
    NavigationIntent,
    PermissionSet,
    RouteMeta,
    RouteTable,
    SessionVerifier,
};

pub use navigator::{
    Navigation,
    Navigator,
};

pub use request::RequestSpec;

pub use session::{
    Credential,
    FileSessionStore,
    MemorySessionStore,
    SessionBackend,
    SessionStore,
    SharedSessionStore,
    create_session_store,
};

#[cfg(feature = "keyring-store")]
pub use session::KeyringSessionStore;

pub use transport::{
    HttpTransport,
    RawResponse,
    Transport,
    TransportError,
};
