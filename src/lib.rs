//! Library crate for arcade-session, exposing the game session core and its runtime.

pub mod config;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;
