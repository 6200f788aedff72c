//! # exclusionms-core
//!
//! In-memory multi-dimensional interval index for real-time MS/MS exclusion
//! decisions.
//!
//! ## Purpose
//!
//! Given a live stream of precursor-ion measurements, decide whether each one
//! falls inside any previously excluded region of a five-dimensional space
//! (charge, mass, retention time, ion mobility, intensity) fast enough to
//! gate instrument acquisition in real time. This crate is the decision core
//! only — the HTTP surface, the acquisition client, and the feedback
//! consumer that drives `add` from confirmed spectrum matches are external
//! collaborators with their contract specified but not implemented here.
//!
//! ## Design philosophy
//!
//! Mass is the one dimension kept in a real index (an augmented interval
//! tree); the other four are post-filtered per candidate, since in practice
//! mass is the most selective bound and the rest are narrow windows around a
//! center. All mutation goes through [`ExclusionEngine`], which owns the
//! single gate the whole store sits behind — nothing should reach into
//! [`ExclusionStore`] directly from outside this crate's own call graph.
//!
//! ## Main components
//!
//! - [`ExclusionEngine`]: the public entry point — the concurrency gate, the
//!   offset register, save/load.
//! - [`ExclusionStore`]: the owned slab of intervals plus its two indexes.
//! - [`ExclusionInterval`] / [`ExclusionPoint`]: the data model.
//! - [`ToleranceConfig`] / [`build_interval`]: turns a confirmed point into a
//!   new exclusion interval.
//! - [`Offset`] / [`OffsetRegister`]: the process-wide point-query correction.

pub mod engine;
pub mod error;
pub mod index;
pub mod model;
pub mod offset;
pub mod persistence;
pub mod store;
pub mod tolerance;

pub use engine::ExclusionEngine;
pub use error::ExclusionError;
pub use model::{ExclusionInterval, ExclusionPoint};
pub use offset::{Offset, OffsetRegister};
pub use store::{ExclusionStore, StoreStats};
pub use tolerance::{build_interval, ToleranceConfig};
