pub mod generator;
pub mod patterns;
pub mod rules;
pub mod sampler;
pub mod scoring;
pub mod stats;
