//! Infrastructure layer: the SeaORM-backed persistence implementation (C2).

pub mod database;

pub use database::{init_database, SeaOrmRepositories};
