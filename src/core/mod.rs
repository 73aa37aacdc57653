// src/core/mod.rs

// The `core` module hosts everything a scan needs, from target validation
// down to the final report. The TUI only talks to `engine`.

/// Data structures shared by every stage: probe results, findings and the
/// aggregate `ScanResults`.
pub mod models;

/// Error types for target parsing, configuration and scan stages.
pub mod error;

/// Target parsing, normalization and scope checks.
pub mod target;

/// The HTTP probe client and the shared concurrency budget.
pub mod probe;

/// Cooperative cancellation shared by the engine and its stages.
pub mod cancel;

/// Built-in and file-backed wordlists.
pub mod wordlists;

/// Discovery engines, the crawler and the passive analyzers.
pub mod scanner;

/// Vulnerability hunters and the registry that selects them.
pub mod hunters;

/// Wrappers around external command-line tools.
pub mod integrations;

/// Deduplicating accumulation of findings into `ScanResults`.
pub mod accumulator;

/// Derives high-value assets and attack vectors from the results.
pub mod attack_surface;

/// Serializes finished results to disk.
pub mod reporter;

/// Static descriptions and remediation advice for vulnerability classes.
pub mod knowledge_base;

/// The scan orchestrator.
pub mod engine;
