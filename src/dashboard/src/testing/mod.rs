//! Test utilities for the dashboard engine.
//!
//! # Feature Flag
//!
//! This module is only available when the `testing` feature is enabled or during tests:
//!
//! ```toml
//! [dev-dependencies]
//! dashboard = { path = "../dashboard", features = ["testing"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use dashboard::testing::ScriptedTransport;
//!
//! let transport = Arc::new(ScriptedTransport::new());
//! transport.push_json("topactions", &json!([]));
//! let gate = transport.push_gated("topactions");
//! // ... issue requests, then resolve the held one late:
//! gate.release_json(&json!([]));
//! ```

mod scripted;

pub use scripted::{Gate, ScriptedTransport};
