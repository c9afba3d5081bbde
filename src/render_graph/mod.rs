//! Render Graph System
//!
//! Passes declare the textures they read and write; compilation orders them
//! so that shadow maps are complete before the lit pass samples them and the
//! lit image is complete before post-processing reads it.

pub mod executor;
pub mod graph;
pub mod pass;
pub mod resource;

pub use executor::*;
pub use graph::*;
pub use pass::*;
pub use resource::*;
