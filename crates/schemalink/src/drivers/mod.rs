//! Metadata source implementations.
//!
//! - [`mysql`]: `INFORMATION_SCHEMA` over SQLx
//! - [`memory`]: fixed rows, for tests and examples

pub mod memory;
pub mod mysql;

pub use memory::MemorySource;
pub use mysql::MysqlSource;
