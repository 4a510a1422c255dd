//! Edge case tests for sailc-sem
