//! Input validation and display helpers shared by front ends.

pub mod format;
pub mod validation;

pub use format::pretty_json;
pub use validation::Validator;
