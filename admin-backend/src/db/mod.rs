pub mod columns;
mod filter;
mod join;
mod sqlite;
mod tables;

pub use filter::{Filter, Page};
pub use join::{embed, ProfileIndex};
pub use sqlite::Database;
pub use tables::Required;

#[cfg(test)]
pub use tables::test_support;
