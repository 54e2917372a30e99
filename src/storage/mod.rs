pub mod db;
mod files;
pub mod models;
mod ownerships;
mod replicas;
mod repository;
mod tables;

pub use db::{Database, DatabaseError, DEFAULT_IMPORTANCE};
pub use tables::*;
