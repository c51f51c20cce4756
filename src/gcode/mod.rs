pub mod file;
pub mod parser;
pub mod transform;
pub mod types;
