//! Writing results to the output tree.

pub mod writer;
