//! # Optimizer Module
//!
//! Orchestrazione del run: dispatcher con worker pool limitato,
//! pipeline per-file e risoluzione dei path speculari.

pub mod media_optimizer;
pub mod path_resolver;
pub mod task_worker;

pub use media_optimizer::MediaOptimizer;
pub use path_resolver::PathResolver;
pub use task_worker::TaskWorker;
