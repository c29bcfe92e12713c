// src/reconcile/mod.rs

//! The watch -> diff -> dependency-expand -> apply reconciliation loop.
//!
//! - [`plan`] computes a cycle's [`ReconcilePlan`] from the watched-path
//!   set, the registry snapshot and the polled filesystem events. It is a
//!   pure function over those inputs.
//! - [`depends`] expands the reload set along reverse dependency edges
//!   until fixpoint.
//! - [`reconciler`] owns the mutable state (watched paths, registry, watch
//!   backend) and applies plans, producing commit batches for the engine.

pub mod depends;
pub mod plan;
pub mod reconciler;

pub use depends::expand_reloads;
pub use plan::{compute_plan, ReconcilePlan};
pub use reconciler::{CommitBatch, LoaderHandle, Reconciler};
