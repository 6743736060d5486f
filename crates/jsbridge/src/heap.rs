//! JavaScript Heap Statistics
//!
//! Host-side snapshot of a runtime's memory usage and the limits
//! configured on it.

use serde::Serialize;

/// Heap size limits applied to a runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeapLimits {
    /// Maximum heap size (bytes)
    pub memory_limit: Option<usize>,
    /// Size at which to trigger GC (bytes)
    pub gc_threshold: Option<usize>,
    /// Maximum interpreter stack (bytes)
    pub max_stack_size: Option<usize>,
}

impl HeapLimits {
    /// Check if size is within limits
    pub fn is_within_limit(&self, size: usize) -> bool {
        self.memory_limit.is_none_or(|limit| size <= limit)
    }
}

/// Heap statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    /// Bytes currently held by the engine allocator
    pub allocated: usize,
    /// Bytes used by live engine objects
    pub used: usize,
    /// Live allocations
    pub allocation_count: usize,
    /// Live objects
    pub object_count: usize,
    /// Live strings
    pub string_count: usize,
    /// Interned atoms
    pub atom_count: usize,
    /// Script function objects
    pub function_count: usize,
    /// Native function objects (host functions included)
    pub native_function_count: usize,
    /// Configured limits at snapshot time
    pub limits: HeapLimits,
}

impl HeapStats {
    /// Memory utilization as percentage of the limit, if one is set
    pub fn utilization(&self) -> Option<f32> {
        self.limits
            .memory_limit
            .filter(|limit| *limit > 0)
            .map(|limit| (self.allocated as f32 / limit as f32) * 100.0)
    }

    /// Format as human-readable string
    pub fn format(&self) -> String {
        let limit = match self.limits.memory_limit {
            Some(limit) => format!("{:.2}MB", limit as f64 / (1024.0 * 1024.0)),
            None => "unlimited".to_string(),
        };
        format!(
            "Heap: {:.2}MB / {}, {} objects, {} strings, {} functions",
            self.allocated as f64 / (1024.0 * 1024.0),
            limit,
            self.object_count,
            self.string_count,
            self.function_count + self.native_function_count
        )
    }
}

/// Clamp an engine counter (reported signed) to `usize`
pub(crate) fn counter(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}
