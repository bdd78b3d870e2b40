//! MySQL/MariaDB driver.

mod source;

pub use source::MysqlSource;
