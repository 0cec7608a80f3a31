pub mod db;
pub mod error;
pub mod sql;
pub mod types;
