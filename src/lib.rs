//! Turns free-form model output into a validated plan of file edits for a
//! Next.js + Drizzle project, keeping the schema file and the UI composition
//! file consistent instead of overwriting them.

pub mod contexts;
pub mod data;
pub mod error;
pub mod registries;

pub use error::AgentError;
