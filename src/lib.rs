pub mod clock;
pub mod config;
pub mod error;
pub mod notifier;
pub mod render;
pub mod scheduler;
pub mod sink;
pub mod sources;
pub mod store;

#[cfg(test)]
mod testing;
