// src/script/mod.rs

//! Script instances and their lifecycle state.
//!
//! - [`instance`] holds [`ScriptInstance`]: one loaded script, its declared
//!   dependencies and its scoped resources.
//! - [`registry`] is the authoritative path -> instance map.
//! - [`resources`] is the scoped resource registry a script allocates into
//!   while running, torn down atomically on terminate.
//! - [`context`] is the capability surface handed to the execution engine
//!   (and through it, to the script itself).

pub mod context;
pub mod instance;
pub mod registry;
pub mod resources;

pub use context::ScriptContext;
pub use instance::ScriptInstance;
pub use registry::ScriptRegistry;
pub use resources::{ResourceScope, ScriptResource};
