//! Chatbot Universe Builder HTTP Server Library
//!
//! Provides the REST API components for testing and reuse.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod services;
