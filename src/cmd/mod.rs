pub mod annotate;
pub mod output;
pub mod patterns;
