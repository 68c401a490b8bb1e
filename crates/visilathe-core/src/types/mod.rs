//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for `Arc<Mutex<T>>` shared between the
//!   interactive session and its worker threads.

pub mod aliases;

pub use aliases::*;
