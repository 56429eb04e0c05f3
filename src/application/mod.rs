// Application layer - Normalization, scheduling and the seams they depend on
pub mod forecast_source;
pub mod normalizer;
pub mod scheduler;
