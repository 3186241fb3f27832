//! Cab schema validation, command compilation and output wrangling.
//!
//! A "cab" is one atomic external task: a declarative schema of inputs and
//! outputs, rendering policies that turn validated values into an argument
//! vector, and wrangler rules that classify the task's output while it runs.

pub mod api;
pub mod cab;
pub mod error;
pub mod policy;
pub mod proc;
pub mod runner;
pub mod schema;
pub mod subst;
pub mod validate;
