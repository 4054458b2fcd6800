//! # Performance Analytics Engine
//!
//! This crate computes the descriptive statistics behind the dashboard: the
//! summary metrics of a NAV curve (total return, CAGR, annualized volatility,
//! Sharpe ratio, max drawdown) and the per-regime diagnostics table.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems and performs no I/O. It depends only on `core-types`
//!   (Layer 0); loading and rendering live elsewhere.
//! - **Stateless Calculation:** The `MetricsEngine` is a stateless
//!   calculator. Given the same immutable series it produces bit-identical
//!   results, which makes it highly reliable and easy to test.
//! - **NaN over panic:** a metric whose denominator degenerates (zero
//!   elapsed time, zero return volatility) comes back as NaN rather than an
//!   error; callers decide how to display it.
//!
//! ## Public API
//!
//! - `MetricsEngine`: the struct that contains the calculation logic.
//! - `PerformanceSummary`: the fixed record of summary metrics.
//! - `RegimeDiagnostics` / `RegimeStats`: the per-regime table, keyed by
//!   label in ascending order.
//! - `AnalyticsError`: the specific error types that can be returned from
//!   this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use report::{PerformanceSummary, RegimeDiagnostics, RegimeStats};
