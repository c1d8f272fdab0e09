//! Monte Carlo simulation of rating trajectories
//!
//! - `sampler`: one categorical draw per transition
//! - `trajectory`: single paths, time-homogeneous or per-period matrices
//! - `batch`: many independent paths, sequential or across the rayon pool

mod batch;
mod sampler;
mod trajectory;

pub use batch::{simulate_batch, simulate_batch_parallel, TrajectoryBatch};
pub use sampler::{sample_categorical, sample_next_state};
pub use trajectory::{simulate_path, simulate_trajectory, Trajectory};
