//! # Dataset Store
//!
//! CSV persistence and loading for the dashboard's two inputs: the raw
//! index price file written by the fetch command, and the master strategy
//! frame exported by the research notebook (NAV curve, regime labels,
//! positions).
//!
//! Column resolution lives here, at the loading boundary: the analytics
//! core is always handed already-resolved series and never sniffs column
//! names itself.

// Declare the modules that constitute this crate.
pub mod error;
pub mod frame;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use error::DatasetError;
pub use frame::MasterFrame;
pub use store::{load_daily_bars, save_daily_bars};
