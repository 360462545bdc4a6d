//! Domain types and pure logic for the DATACO admin dashboard.
//!
//! Nothing in this crate performs I/O. It holds the wire models, form
//! payloads with their validation rules, the interaction guard, and the
//! realtime event reducer shared by the client and dashboard crates.

pub mod bug_report;
pub mod dataco;
pub mod error;
pub mod forms;
pub mod interaction;
pub mod priority;
pub mod project;
pub mod realtime;
pub mod subtask;
pub mod tags;
pub mod task;
pub mod types;
pub mod user;
