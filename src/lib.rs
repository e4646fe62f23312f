pub mod config;
pub mod entity;
pub mod error;
pub mod plugins;
pub mod policy;
pub mod prelude;
pub mod state;
pub mod sv;
