//! Core modules for Tinbergen's coding engine.
//!
//! Everything here is synchronous and free of I/O except [`config`]. The
//! engine never logs; plugins log around it.

pub mod config;
pub mod document;
pub mod error;
pub mod ethogram;
pub mod ethogram_doc;
pub mod hierarchy;
pub mod keyvals;
pub mod nameset;
pub mod output;
pub mod template;
