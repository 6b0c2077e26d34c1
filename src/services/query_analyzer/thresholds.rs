//! Static detection thresholds
//!
//! `Thresholds` is an immutable value handed to every detection call.
//! The remaining limits are fixed constants in [`defaults`].

use serde::{Deserialize, Serialize};

pub mod defaults {
    /// Execution time at or above which a query is critically slow (seconds)
    pub const CRITICAL_EXECUTION_SECS: f64 = 10.0;

    /// Execution time at or above which a query is slow (seconds)
    pub const HIGH_EXECUTION_SECS: f64 = 5.0;

    /// Default scanned-row limit
    pub const MAX_SCAN_ROWS: u64 = 10_000_000;

    /// Default scanned-bytes limit (1 GiB)
    pub const MAX_SCAN_BYTES: u64 = 1_073_741_824;

    /// Memory usage above which a query is memory intensive (512 MiB)
    pub const MEMORY_INTENSIVE_BYTES: u64 = 512 * 1024 * 1024;
}

/// Scan-volume limits for the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub max_scan_rows: u64,
    pub max_scan_bytes: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { max_scan_rows: defaults::MAX_SCAN_ROWS, max_scan_bytes: defaults::MAX_SCAN_BYTES }
    }
}

impl Thresholds {
    pub fn new(max_scan_rows: u64, max_scan_bytes: u64) -> Self {
        Self { max_scan_rows, max_scan_bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.max_scan_rows, 10_000_000);
        assert_eq!(t.max_scan_bytes, 1024 * 1024 * 1024);
    }
}
