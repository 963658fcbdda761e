//! Answer verification pipeline.
//!
//! A short sequential pipeline over `(question, answer)` text:
//!
//! 1. Rule check - does the answer carry the textual markers of the right
//!    method for the detected problem type?
//! 2. Numeric reconciliation - for types where both sides are extractable,
//!    recompute the expected value and compare within a tolerance.
//!
//! Stages short-circuit on the first finding. Every check is a pure,
//! synchronous function of its inputs; nothing is stored between calls.

pub mod numeric;
pub mod pipeline;
pub mod result;
pub mod rules;

pub use pipeline::{ComplexityGate, Verifier};
pub use result::{ErrorKind, Stage, VerificationResult};
