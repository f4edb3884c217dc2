pub mod timing;

pub use timing::ScopedTimer;
