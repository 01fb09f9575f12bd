//! Core types for the co-active medication engine.
//!
//! This crate holds the medication record, the canonical interval algebra
//! used by every other crate, and the injected relatedness capability. It
//! performs no I/O.

pub mod date;
pub mod error;
pub mod interval;
pub mod medication;
pub mod relatedness;

pub use error::{Error, Result};
pub use interval::{Bound, CanonicalInterval, DateRepair};
pub use medication::{Medication, RawMedication, normalize_drug_name};
pub use relatedness::Relatedness;
