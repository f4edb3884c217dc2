pub mod error;
pub mod graph;
pub mod host;
pub mod loader;
pub mod model;
pub mod util;

pub use error::KinographError;
