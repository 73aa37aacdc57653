// src/ui/widgets/mod.rs

pub mod analysis_view; // Vulnerabilities with knowledge-base details.
pub mod disclaimer_popup;
pub mod footer;
pub mod input;
pub mod log_view;
pub mod progress; // Phase progress while a batch runs.
pub mod results; // Inventory of everything discovered.
pub mod summary;
