pub mod effect_host;
pub mod ofx;
pub mod property_set;

pub use effect_host::ImageEffectHost;
pub use property_set::PropertySet;
