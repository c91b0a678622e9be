//! Input table schema
//!
//! This module defines the engagement record contract and the adapter that
//! turns a CSV table into validated records.

mod adapter;
mod record;

pub use adapter::*;
pub use record::*;
