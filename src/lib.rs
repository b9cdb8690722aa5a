pub mod cli;
pub mod controller;
pub mod error;
pub mod policy;
pub mod store;
