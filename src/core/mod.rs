//! Configuration and payload models shared by the HTTP layer and handlers

pub mod config;
pub mod models;
