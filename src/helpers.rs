pub mod average;
pub mod result;
pub mod tracing;
