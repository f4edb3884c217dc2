pub mod builder;
pub mod composite;
pub mod generator;
pub mod node;
pub mod plugin;
pub mod read;
pub mod time_warp;
pub mod transition;

pub use builder::ImageGraph;
pub use node::{ImageNode, SharedNode, shared};
