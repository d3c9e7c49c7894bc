pub mod client;
pub mod parser;
pub mod types;

pub use client::{Connection, SolaxClient};
pub use parser::ResponseFormat;
pub use types::{RawSnapshot, RawValue};
