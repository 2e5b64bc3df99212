//! Output Coordinator Integration Tests
//!
//! Organized by concern:
//! - `scenarios`: default filenames and file contents, end to end
//! - `routing`: which emitter serves which slot, via a recording backend
//! - `failures`: partial failure and file counts
//! - `properties`: proptest properties of the filename policy and routing

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

pub mod failures;
pub mod properties;
pub mod routing;
pub mod scenarios;

pub mod util;
