//! Integration test crate for the threshold-cryptography harness.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise end-to-end flows (mTLS transport, the bridge, jobs, and
//! the protocol façades) across multiple workspace crates, using the
//! `mock` engine backend as every real deployment's test double.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p cbmpc-integration-tests -- --ignored
//! ```
