//! End-to-end tests for logsift live in `tests/`. This crate has no library code.
