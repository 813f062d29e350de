pub mod attributes;
pub mod detector;

pub use detector::detect_codes;
