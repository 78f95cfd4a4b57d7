//! Supporting pieces shared by the analysis engines
//!
//! - Binarization (single, band and band-complement threshold rules)
//! - Traversal instrumentation (per-thread pass counter)

pub mod binarization;
pub mod traversal;
