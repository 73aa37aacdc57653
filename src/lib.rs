// src/lib.rs

//! ShadowRecon: asynchronous reconnaissance of web targets.
//!
//! The library exposes the scan orchestrator ([`core::engine::ShadowEngine`]) and
//! every stage it drives. The terminal front end in `main.rs` is a thin consumer.

pub mod config;
pub mod core;
pub mod logging;
