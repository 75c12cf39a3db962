pub mod config;
pub mod directive;
pub mod edge;
pub mod error;
pub mod flow;
pub mod io;
pub mod manifest;
pub mod paths;
pub mod registry;
pub mod schema;
pub mod state;
pub mod store;
pub mod types;
pub mod value;

pub use error::{CompassError, Result};
