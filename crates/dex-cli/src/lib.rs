//! CLI library components for the document extraction engine.

#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod logging;
