//! Script runtime: one isolated QuickJS heap.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::heap::{counter, HeapLimits, HeapStats};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

static NEXT_RUNTIME_ID: AtomicU64 = AtomicU64::new(1);

/// An isolated script heap that contexts are created inside.
///
/// Not `Clone`: each value owns exactly one handle on the native runtime.
/// Contexts hold their own handle on the same heap, so dropping the
/// `Runtime` while a context is still alive only defers the release.
pub struct Runtime {
    id: u64,
    inner: rquickjs::Runtime,
    limits: Cell<HeapLimits>,
}

impl Runtime {
    /// Create a runtime with engine defaults
    pub fn new() -> Result<Self> {
        let inner = rquickjs::Runtime::new()
            .map_err(|e| Error::EngineInit(format!("Failed to create JS runtime: {e}")))?;
        let id = NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed);

        info!("Created JS runtime {}", id);

        Ok(Self {
            id,
            inner,
            limits: Cell::new(HeapLimits::default()),
        })
    }

    /// Create a runtime and apply the limits from `config`
    pub fn with_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let runtime = Self::new()?;
        if let Some(limit) = config.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(threshold) = config.gc_threshold {
            runtime.set_gc_threshold(threshold);
        }
        if let Some(stack) = config.max_stack_size {
            runtime.set_max_stack_size(stack);
        }
        Ok(runtime)
    }

    /// Runtime identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cap the heap; allocations past the limit throw inside the script
    pub fn set_memory_limit(&self, bytes: usize) {
        debug!("Runtime {} memory limit set to {}KB", self.id, bytes / 1024);
        self.inner.set_memory_limit(bytes);
        self.update_limits(|limits| limits.memory_limit = Some(bytes));
    }

    /// Allocated size at which the collector runs
    pub fn set_gc_threshold(&self, bytes: usize) {
        debug!("Runtime {} GC threshold set to {}KB", self.id, bytes / 1024);
        self.inner.set_gc_threshold(bytes);
        self.update_limits(|limits| limits.gc_threshold = Some(bytes));
    }

    /// Maximum interpreter stack
    pub fn set_max_stack_size(&self, bytes: usize) {
        self.inner.set_max_stack_size(bytes);
        self.update_limits(|limits| limits.max_stack_size = Some(bytes));
    }

    /// Run a full collection now
    pub fn run_gc(&self) {
        self.inner.run_gc();
        debug!("Runtime {} GC complete", self.id);
    }

    /// Current limits
    pub fn limits(&self) -> HeapLimits {
        self.limits.get()
    }

    /// Snapshot of engine memory usage
    pub fn heap_stats(&self) -> HeapStats {
        let usage = self.inner.memory_usage();

        HeapStats {
            allocated: counter(usage.malloc_size),
            used: counter(usage.memory_used_size),
            allocation_count: counter(usage.malloc_count),
            object_count: counter(usage.obj_count),
            string_count: counter(usage.str_count),
            atom_count: counter(usage.atom_count),
            function_count: counter(usage.js_func_count),
            native_function_count: counter(usage.c_func_count),
            limits: self.limits.get(),
        }
    }

    pub(crate) fn raw(&self) -> &rquickjs::Runtime {
        &self.inner
    }

    fn update_limits(&self, f: impl FnOnce(&mut HeapLimits)) {
        let mut limits = self.limits.get();
        f(&mut limits);
        self.limits.set(limits);
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        debug!("Dropping JS runtime {}", self.id);
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("id", &self.id)
            .field("limits", &self.limits.get())
            .finish()
    }
}
