pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod promote;
pub mod registry;
