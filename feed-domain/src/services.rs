// Domain services

pub mod evaluator;

pub use evaluator::*;
