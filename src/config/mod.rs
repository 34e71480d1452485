//! Configuration models for the worker pool.

pub mod worker;

pub use worker::WorkerConfig;
