//! Single-context engine façade.

use crate::config::EngineConfig;
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::heap::HeapStats;
use crate::runtime::Runtime;
use crate::value::{FromScript, HostValue};
use std::path::Path;

/// A runtime and one context behind one handle.
///
/// ```rust,ignore
/// let engine = Engine::new()?;
/// engine.register_function("multiply", |args| {
///     let a: f64 = args[0].parse()?;
///     let b: f64 = args[1].parse()?;
///     Ok((a * b).to_string())
/// });
/// assert_eq!(engine.eval("multiply('5', '10')")?, "50");
/// ```
#[derive(Debug)]
pub struct Engine {
    // Declared first so it drops before the runtime
    context: ExecutionContext,
    runtime: Runtime,
}

impl Engine {
    /// Create an engine with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(&EngineConfig::standard())
    }

    /// Create an engine from a configuration
    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        let runtime = Runtime::with_config(config)?;
        let context = ExecutionContext::with_intrinsics(&runtime, config.intrinsics)?;

        if config.extended_capabilities {
            context.enable_extended_capabilities();
        }

        Ok(Self { context, runtime })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn eval(&self, source: &str) -> Result<String> {
        self.context.eval(source)
    }

    pub fn eval_with_origin(&self, source: &str, origin: &str) -> Result<String> {
        self.context.eval_with_origin(source, origin)
    }

    pub fn eval_as<T: FromScript>(&self, source: &str, origin: &str) -> Result<T> {
        self.context.eval_as(source, origin)
    }

    pub fn eval_as_string(&self, source: &str) -> Result<String> {
        self.context.eval_as_string(source)
    }

    pub fn eval_as_int(&self, source: &str) -> Result<i32> {
        self.context.eval_as_int(source)
    }

    pub fn eval_as_double(&self, source: &str) -> Result<f64> {
        self.context.eval_as_double(source)
    }

    pub fn eval_as_bool(&self, source: &str) -> Result<bool> {
        self.context.eval_as_bool(source)
    }

    pub fn eval_file(&self, path: impl AsRef<Path>) -> Result<String> {
        self.context.eval_file(path)
    }

    pub fn set_global(&self, name: &str, value: impl Into<HostValue>) {
        self.context.set_global(name, value)
    }

    pub fn get_global_as_string(&self, name: &str) -> String {
        self.context.get_global_as_string(name)
    }

    pub fn get_global(&self, name: &str) -> Option<HostValue> {
        self.context.get_global(name)
    }

    pub fn call_function<S: AsRef<str>>(&self, name: &str, args: &[S]) -> Result<String> {
        self.context.call_function(name, args)
    }

    pub fn register_function<F>(&self, name: &str, function: F)
    where
        F: Fn(&[String]) -> anyhow::Result<String> + 'static,
    {
        self.context.register_function(name, function)
    }

    pub fn register_simple_function<F>(&self, name: &str, function: F)
    where
        F: Fn() -> anyhow::Result<String> + 'static,
    {
        self.context.register_simple_function(name, function)
    }

    pub fn unregister_function(&self, name: &str) -> bool {
        self.context.unregister_function(name)
    }

    pub fn set_console_log<F>(&self, callback: F)
    where
        F: Fn(&str) + 'static,
    {
        self.context.set_console_log(callback)
    }

    pub fn enable_extended_capabilities(&self) {
        self.context.enable_extended_capabilities()
    }

    /// Cap the heap of the underlying runtime
    pub fn set_memory_limit(&self, bytes: usize) {
        self.runtime.set_memory_limit(bytes)
    }

    pub fn set_gc_threshold(&self, bytes: usize) {
        self.runtime.set_gc_threshold(bytes)
    }

    pub fn run_gc(&self) {
        self.runtime.run_gc()
    }

    pub fn heap_stats(&self) -> HeapStats {
        self.runtime.heap_stats()
    }

    /// One-line memory summary for logs
    pub fn memory_summary(&self) -> String {
        format!(
            "Runtime {} / context {}: {}",
            self.runtime.id(),
            self.context.id(),
            self.heap_stats().format()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Intrinsics;

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new().unwrap();

        assert_eq!(engine.eval_as_int("2 + 2").unwrap(), 4);
        assert!(engine.runtime().limits().memory_limit.is_none());
        assert!(engine.memory_summary().starts_with("Runtime "));
    }

    #[test]
    fn test_engine_with_config() {
        let config = EngineConfig {
            extended_capabilities: true,
            intrinsics: Intrinsics::Full,
            ..EngineConfig::constrained()
        };
        let engine = Engine::with_config(&config).unwrap();

        assert!(engine.context().extended_capabilities_enabled());
        assert_eq!(engine.heap_stats().limits.memory_limit, Some(16 * 1024 * 1024));
        assert_eq!(engine.eval("typeof print").unwrap(), "function");
    }

    #[test]
    fn test_engine_facade_delegates() {
        let engine = Engine::new().unwrap();

        engine.set_global("playerName", "Steve");
        assert_eq!(engine.eval("'Welcome, ' + playerName + '!'").unwrap(), "Welcome, Steve!");

        engine.eval(
            r#"
            var player = { name: 'Steve', level: 42, items: ['Sword', 'Shield'] };
            function getServerCount() { return 3; }
            "#,
        )
        .unwrap();

        assert_eq!(engine.eval("player.name").unwrap(), "Steve");
        assert_eq!(engine.eval_as_int("player.level").unwrap(), 42);
        assert_eq!(engine.eval("player.items.join(', ')").unwrap(), "Sword, Shield");
        assert_eq!(engine.call_function::<&str>("getServerCount", &[]).unwrap(), "3");
        assert_eq!(engine.get_global_as_string("playerName"), "Steve");
    }

    #[test]
    fn test_engines_are_isolated() {
        let a = Engine::new().unwrap();
        let b = Engine::new().unwrap();

        a.set_global("shared", 1);
        assert_eq!(b.get_global_as_string("shared"), "undefined");
    }
}
