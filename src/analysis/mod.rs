pub mod classifier;
pub mod decoder;
pub mod sampler;
