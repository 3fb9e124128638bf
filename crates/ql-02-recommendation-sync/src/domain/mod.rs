pub mod errors;
pub mod payloads;
