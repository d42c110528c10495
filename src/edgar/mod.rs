// src/edgar/mod.rs
pub mod client;
pub mod models;

pub use client::{EdgarClient, DEFAULT_USER_AGENT};
pub use models::FilingInfo;
