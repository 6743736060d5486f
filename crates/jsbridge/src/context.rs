//! JavaScript Context Management
//!
//! One global scope inside a [`Runtime`], with the evaluation, global
//! access, function call and host-function surface built on top of it.

use crate::config::Intrinsics;
use crate::console::ConsoleSink;
use crate::error::{Error, Result};
use crate::exception;
use crate::extended;
use crate::registry::{HostFunction, HostFunctionRegistry};
use crate::runtime::Runtime;
use crate::value::{discard_pending, FromScript, HostValue};
use rquickjs::prelude::{Rest, This};
use rquickjs::{context::EvalOptions, Value};
use std::cell::Cell;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Origin label used when the caller supplies none
pub const DEFAULT_ORIGIN: &str = "<eval>";

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A single global scope in which script source runs.
///
/// The context keeps its runtime's heap alive for as long as it exists,
/// so it can never outlive the engine it evaluates in. Host functions and
/// the console sink registered here are released when it is dropped.
pub struct ExecutionContext {
    /// Context identifier
    id: u64,
    /// Engine context
    inner: rquickjs::Context,
    /// Host closures exposed to script
    registry: HostFunctionRegistry,
    /// `console.log` target
    console: ConsoleSink,
    /// `print`, `std` and `os` installed
    extended: Cell<bool>,
    /// Creation time
    created_at: Instant,
}

impl ExecutionContext {
    /// Create a context with the full intrinsic set
    pub fn new(runtime: &Runtime) -> Result<Self> {
        Self::with_intrinsics(runtime, Intrinsics::Full)
    }

    /// Create a context with the chosen intrinsic set
    pub fn with_intrinsics(runtime: &Runtime, intrinsics: Intrinsics) -> Result<Self> {
        let inner = match intrinsics {
            Intrinsics::Full => rquickjs::Context::full(runtime.raw()),
            Intrinsics::Base => rquickjs::Context::base(runtime.raw()),
        }
        .map_err(|e| Error::EngineInit(format!("Failed to create JS context: {e}")))?;

        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        let console = ConsoleSink::default();

        inner
            .with(|ctx| console.install(&ctx).map_err(|e| exception::translate(&ctx, e, "console")))
            .map_err(|e| Error::EngineInit(format!("Failed to install console: {e}")))?;

        info!(
            "Created JS context {} in runtime {} ({:?} intrinsics)",
            id,
            runtime.id(),
            intrinsics
        );

        Ok(Self {
            id,
            inner,
            registry: HostFunctionRegistry::default(),
            console,
            extended: Cell::new(false),
            created_at: Instant::now(),
        })
    }

    /// Context identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Evaluate a global script and return its completion value as a string
    pub fn eval(&self, source: &str) -> Result<String> {
        self.eval_as(source, DEFAULT_ORIGIN)
    }

    /// Evaluate with an origin label used in error reports
    pub fn eval_with_origin(&self, source: &str, origin: &str) -> Result<String> {
        self.eval_as(source, origin)
    }

    /// Evaluate and coerce the completion value to string
    pub fn eval_as_string(&self, source: &str) -> Result<String> {
        self.eval_as(source, DEFAULT_ORIGIN)
    }

    /// Evaluate and coerce with ToInt32 (wraps modulo 2^32, NaN is 0)
    pub fn eval_as_int(&self, source: &str) -> Result<i32> {
        self.eval_as(source, DEFAULT_ORIGIN)
    }

    /// Evaluate and coerce with ToNumber
    pub fn eval_as_double(&self, source: &str) -> Result<f64> {
        self.eval_as(source, DEFAULT_ORIGIN)
    }

    /// Evaluate and coerce with ToBoolean
    pub fn eval_as_bool(&self, source: &str) -> Result<bool> {
        self.eval_as(source, DEFAULT_ORIGIN)
    }

    /// Evaluate and convert the completion value to `T`.
    ///
    /// Only a script throw is an error; the conversion itself falls back
    /// to `T`'s zero value.
    pub fn eval_as<T: FromScript>(&self, source: &str, origin: &str) -> Result<T> {
        self.eval_bytes(source.as_bytes().to_vec(), origin)
    }

    /// Read a script file and evaluate it with its path as origin
    pub fn eval_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let source = std::fs::read(path).map_err(|source| Error::Io {
            path: origin.clone(),
            source,
        })?;

        self.eval_bytes(source, &origin)
    }

    fn eval_bytes<T: FromScript>(&self, source: Vec<u8>, origin: &str) -> Result<T> {
        debug!("Context {} evaluating {} bytes from {}", self.id, source.len(), origin);

        self.inner.with(|ctx| {
            // Global code runs sloppy, like a classic script tag
            let mut options = EvalOptions::default();
            options.strict = false;
            let result = ctx.eval_with_options::<Value, _>(source, options);
            let value = exception::check(&ctx, result, origin)?;
            Ok(T::from_script(&ctx, value))
        })
    }

    /// Bind a primitive on the global object
    pub fn set_global(&self, name: &str, value: impl Into<HostValue>) {
        let value = value.into();
        self.inner.with(|ctx| {
            if let Err(err) = ctx.globals().set(name, value) {
                discard_pending(&ctx, &err);
                warn!("Context {} failed to set global {}: {}", self.id, name, err);
            }
        });
    }

    /// Read a global coerced to string; a missing global reads as "undefined"
    pub fn get_global_as_string(&self, name: &str) -> String {
        self.inner.with(|ctx| match ctx.globals().get::<_, Value>(name) {
            Ok(value) => String::from_script(&ctx, value),
            Err(err) => {
                discard_pending(&ctx, &err);
                String::new()
            }
        })
    }

    /// Read a primitive global; `None` for missing or non-primitive bindings
    pub fn get_global(&self, name: &str) -> Option<HostValue> {
        self.inner.with(|ctx| match ctx.globals().get::<_, Value>(name) {
            Ok(value) => HostValue::from_value(&value),
            Err(err) => {
                discard_pending(&ctx, &err);
                None
            }
        })
    }

    /// Call a global function with string arguments
    pub fn call_function<S: AsRef<str>>(&self, name: &str, args: &[S]) -> Result<String> {
        debug!("Context {} calling {} with {} args", self.id, name, args.len());

        self.inner.with(|ctx| {
            let globals = ctx.globals();
            let target = exception::check(&ctx, globals.get::<_, Value>(name), name)?;
            let Some(function) = target.into_function() else {
                return Err(Error::NotCallable {
                    name: name.to_owned(),
                });
            };

            let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_owned()).collect();
            let result = function.call::<_, Value>((This(globals), Rest(args)));
            let value = exception::check(&ctx, result, name)?;
            Ok(String::from_script(&ctx, value))
        })
    }

    /// Expose a host closure as a global function.
    ///
    /// Script arguments arrive stringified. An `Err` is thrown back into
    /// the script as an `InternalError` carrying the error text.
    pub fn register_function<F>(&self, name: &str, function: F)
    where
        F: Fn(&[String]) -> anyhow::Result<String> + 'static,
    {
        self.register(name, HostFunction::Variadic(Box::new(function)));
    }

    /// Expose a zero-argument host closure as a global function
    pub fn register_simple_function<F>(&self, name: &str, function: F)
    where
        F: Fn() -> anyhow::Result<String> + 'static,
    {
        self.register(name, HostFunction::Simple(Box::new(function)));
    }

    fn register(&self, name: &str, function: HostFunction) {
        if self.registry.insert(name, function) {
            debug!("Context {} replaced host function {}", self.id, name);
        } else {
            debug!("Context {} registered host function {}", self.id, name);
        }

        self.inner.with(|ctx| {
            if let Err(err) = self.registry.install(&ctx, name) {
                discard_pending(&ctx, &err);
                warn!("Context {} failed to expose {}: {}", self.id, name, err);
            }
        });
    }

    /// Remove a host function and its global binding
    pub fn unregister_function(&self, name: &str) -> bool {
        if !self.registry.remove(name) {
            return false;
        }

        self.inner.with(|ctx| {
            if let Err(err) = ctx.globals().remove(name) {
                discard_pending(&ctx, &err);
            }
        });
        debug!("Context {} unregistered host function {}", self.id, name);
        true
    }

    /// Names of the registered host functions, sorted
    pub fn registered_functions(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Whether `name` is a registered host function
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Route `console.log` to `callback`, replacing any previous sink
    pub fn set_console_log<F>(&self, callback: F)
    where
        F: Fn(&str) + 'static,
    {
        self.console.set(callback);
        self.reinstall_console();
    }

    /// Route `console.log` back to the log target
    pub fn clear_console_log(&self) {
        self.console.clear();
        self.reinstall_console();
    }

    fn reinstall_console(&self) {
        self.inner.with(|ctx| {
            if let Err(err) = self.console.install(&ctx) {
                discard_pending(&ctx, &err);
                warn!("Context {} failed to install console: {}", self.id, err);
            }
        });
    }

    /// Install `print`, `std` and `os`; later calls do nothing
    pub fn enable_extended_capabilities(&self) {
        if self.extended.replace(true) {
            return;
        }

        self.inner.with(|ctx| {
            if let Err(err) = extended::install(&ctx, self.created_at) {
                discard_pending(&ctx, &err);
                warn!("Context {} failed to enable extended capabilities: {}", self.id, err);
                self.extended.set(false);
            }
        });
    }

    /// Whether extended capabilities are installed
    pub fn extended_capabilities_enabled(&self) -> bool {
        self.extended.get()
    }

    /// Time since creation
    pub fn uptime(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    #[cfg(test)]
    pub(crate) fn with_ctx<R>(&self, f: impl FnOnce(rquickjs::Ctx<'_>) -> R) -> R {
        self.inner.with(f)
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        debug!(
            "Dropping JS context {} ({} host functions)",
            self.id,
            self.registry.len()
        );
        self.registry.clear();
        self.console.clear();
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("host_functions", &self.registry.names())
            .field("extended", &self.extended.get())
            .finish()
    }
}
