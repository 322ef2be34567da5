//! Reading evaluator tables and writing histogram files.

pub mod hdf5;
