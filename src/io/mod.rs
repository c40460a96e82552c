//! File database and transactional writes.

mod filedb;
mod stat;
mod transaction;

pub use filedb::FileDB;
pub use stat::{hexdigest_file, hexdigest_str, FileRecord};
pub use transaction::{
    Action, Create, Delete, Replace, Track, Transaction, TransactionMode, Update,
};
