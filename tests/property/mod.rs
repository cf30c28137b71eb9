//! Property-based tests for merge, bookmark, and projection guarantees
