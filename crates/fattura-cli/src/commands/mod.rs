pub mod batch;
pub mod columns;
pub mod config;
pub mod input;
pub mod process;
