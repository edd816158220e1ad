//! Configuration loading and schema definitions
//!
//! Search, encoder and logging settings shared by the library and the binary.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
