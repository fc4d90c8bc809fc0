//! Compute layer for query processing.
//!
//! This module holds the pure computation behind a query, independent of
//! where layer data comes from:
//! - Input validation
//! - Uncertainty resolution and per-layer adjustment
//! - Nearest-point search over point layers

pub mod spatial;
pub mod uncertainty;
pub mod validation;
