//! ccr-cutover - cross-cluster replication cutover and bootstrap
//!
//! Promotes caught-up follower indices into independent writable indices,
//! and establishes the follow relationships a fresh follower cluster lacks.

pub mod cli;
pub mod client;
pub mod cutover;
pub mod observability;
pub mod promotion;
pub mod reconcile;
pub mod status;
