//! jsbridge - QuickJS Embedding Layer
//!
//! Creates isolated script environments, evaluates source, moves
//! primitive values across the boundary and exposes Rust closures as
//! script functions.
//!
//! # Layers
//!
//! | Type | Owns | Notes |
//! |------|------|-------|
//! | [`Runtime`] | one heap | memory limit, GC threshold, stack size |
//! | [`ExecutionContext`] | one global scope | keeps its runtime's heap alive |
//! | [`Engine`] | runtime + one context | the usual entry point |
//!
//! # Errors
//!
//! Every script throw becomes [`Error::Script`] with the thrown value
//! stringified. The context stays usable afterwards. Typed evaluation
//! never fails on conversion: an unconvertible value yields `0`, `0.0`,
//! `false` or `""`.
//!
//! # Threading
//!
//! Runtimes and contexts are `!Send`; each one runs synchronously on the
//! thread that created it. Independent runtimes may live on separate
//! threads.

mod config;
mod console;
mod context;
mod engine;
mod error;
mod exception;
mod extended;
mod heap;
mod registry;
mod runtime;
mod value;

pub use config::{ConfigError, EngineConfig, Intrinsics};
pub use context::{ExecutionContext, DEFAULT_ORIGIN};
pub use engine::Engine;
pub use error::{Error, Result};
pub use heap::{HeapLimits, HeapStats};
pub use runtime::Runtime;
pub use value::{FromScript, HostValue};
