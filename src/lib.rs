//! Synthetic chromothripsis benchmarks: shatter a chromosome, reassemble a
//! random subset of its fragments, and report the breakpoints as truth.

pub mod assemble;
pub mod error;
pub mod fragment;
pub mod logger;
pub mod output;
pub mod random;
pub mod repeat;
pub mod seq;
pub mod sim;

pub use error::{Error, Result};
