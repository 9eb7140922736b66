pub mod consolidate;
pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod scan;
pub mod sync;

pub use error::{Result, ToolError};
