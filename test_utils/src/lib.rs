//! Shared test support: quickcheck generators and on-disk fixtures

pub mod fixtures;
pub mod generator;
