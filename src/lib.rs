// Core of the trainer. The terminal front end in main.rs drives it through
// `trainer::Trainer::dispatch`; benches and integration tests use it directly.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod session;
pub mod store;
pub mod trainer;
