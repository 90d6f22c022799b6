//! Timing smoke tests for pool operations
