pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod index;
pub mod instance;
pub mod model;
pub mod sources;
pub mod state;
pub mod store;
pub mod ui;

pub use error::{Error, Result};
