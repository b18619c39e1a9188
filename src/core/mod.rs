//! Core types & traits: domain-agnostic contracts for tools and errors.

pub mod content;
pub mod error;
pub mod tool;
