//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod fetch;
mod run;
mod serve;
mod tools;

pub use ask::{run_ask, run_random};
pub use config::run_config;
pub use doctor::run_doctor;
pub use fetch::run_fetch;
pub use run::{run_batch, run_submit};
pub use serve::run_serve;
pub use tools::run_tools;
