pub mod download;
pub mod engine;
pub mod monitor;
pub mod observability;
pub mod persistence;
pub mod storage;
