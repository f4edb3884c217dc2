use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scales the speed at which time passes for the item the effect is
/// attached to. A scalar of 2.0 plays the item at double speed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LinearTimeWarp {
    #[serde(default = "default_time_scalar")]
    pub time_scalar: f64,
}

fn default_time_scalar() -> f64 {
    1.0
}

/// An effect resolved by name through the image effect host, built in or
/// loaded from a plugin.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CustomEffect {
    pub effect_name: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind")]
pub enum Effect {
    LinearTimeWarp(LinearTimeWarp),
    Custom(CustomEffect),
}
