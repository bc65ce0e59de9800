// src/analyze/mod.rs
pub mod classifier;

pub use classifier::{Classifier, Confidence, Verdict};
