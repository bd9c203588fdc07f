//! Zero Downtime Tester.
//!
//! A continuous-validation harness that proves a live deployment stays
//! correct and available while it is upgraded in place. Three concurrent
//! activity streams share one run: the upgrade driver re-deploys the
//! system under test, the probe scheduler exercises its endpoints, and the
//! workflow verifier launches long-running workflow instances and confirms
//! they reach terminal state.

#![forbid(unsafe_code)]

pub mod context;
pub mod counters;
pub mod probes;
pub mod sequences;
pub mod suite;
pub mod upgrade;
