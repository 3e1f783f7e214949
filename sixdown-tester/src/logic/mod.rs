pub mod batch;
pub mod loader;
pub mod reports;
pub mod seeds;

pub use batch::{BatchReport, plan_jobs, run_batch, simulate_one};
pub use loader::{FileLoader, Prepared};
pub use seeds::{expand_iterations, resolve_seed_inputs};
