// src/lib.rs

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod nwis;
pub mod server;
pub mod table;
pub mod tools;
