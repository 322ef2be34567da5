pub mod config;
pub mod cuts;
pub mod hist;
pub mod io;
pub mod scan;
pub mod study;
pub mod utils;

/// Scalar type of every ntuple column.
pub type Value = f32;

pub type BoxErr<T> = Result<T, Box<dyn std::error::Error>>;
