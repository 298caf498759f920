//! patchwire - client side of a remote-rendering protocol.
//!
//! A rendering core decides what the UI looks like and ships it as bytes:
//! one initial tree, then patches that replay the core's own diff. This
//! crate turns those bytes into a live host tree and keeps it in sync. It
//! never diffs and keeps no shadow copy; the host tree is the only state.
//!
//! - [`Builder`] materializes fresh subtrees.
//! - [`patch`] checks and applies patches in place.
//! - [`EventBridge`] maps handler attributes to host listeners and reports
//!   fired events back to the core as fixed-layout records.
//! - [`Renderer`] ties one host, one core and one tree together.
//!
//! Logging goes through `tracing`; the library never installs a subscriber.

pub mod bridge;
pub mod builder;
pub mod config;
pub mod error;
pub mod host;
pub mod patch;
pub mod renderer;
pub mod snapshot;

pub use bridge::{EventBridge, Sink};
pub use builder::{Builder, Mounted};
pub use config::{Config, ConfigError};
pub use error::{ErrorClass, Mismatch, RenderError};
pub use host::{Callback, ElementName, Host, HostError, MemoryDocument, NodeId};
pub use renderer::Renderer;
