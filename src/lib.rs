//! Buildprint Runner - Issue diagnosis service
//!
//! Turns a support issue into a diagnostic report by driving the Anthropic
//! Messages API through a bounded tool-use loop, with tools supplied by an MCP
//! server. When the tool service is unreachable the run degrades to a single
//! model call without tools.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
