use crate::error::KinographError;
use crate::graph::node::{ImageNode, SharedNode};
use crate::loader::image::Image;
use crate::model::time::RationalTime;

/// Scales the local time handed to its input by a constant factor. A
/// scalar of 2.0 plays the input at double speed, 0.5 at half speed.
pub struct LinearTimeWarpNode {
    time_scalar: f64,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl LinearTimeWarpNode {
    pub fn new(time_scalar: f64, input: SharedNode) -> LinearTimeWarpNode {
        LinearTimeWarpNode {
            time_scalar,
            inputs: vec![input],
            time_offset: RationalTime::default(),
        }
    }
}

impl ImageNode for LinearTimeWarpNode {
    fn label(&self) -> &str {
        "LinearTimeWarp"
    }

    fn inputs(&self) -> &[SharedNode] {
        &self.inputs
    }

    fn time_offset(&self) -> RationalTime {
        self.time_offset
    }

    fn set_time_offset(&mut self, offset: RationalTime) {
        self.time_offset = offset;
    }

    fn exec(&mut self, time: RationalTime) -> Result<Image, KinographError> {
        let local = self.local_time(time);
        let scaled = RationalTime::new(local.value() * self.time_scalar, local.rate());
        match self.inputs.first() {
            Some(input) => input.borrow_mut().exec(scaled),
            None => Ok(Image::new(0, 0)),
        }
    }
}
