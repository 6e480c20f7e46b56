//! API implementation submodules.
//!
//! Each submodule contains `impl EdgePressClient` blocks that extend the
//! public API. The struct definition remains in `lib.rs`.

mod account;
mod builder;

pub use builder::EdgePressClientBuilder;
