use std::cell::RefCell;
use std::rc::Rc;

use crate::error::KinographError;
use crate::loader::image::Image;
use crate::model::time::RationalTime;

/// Nodes are shared within one frame's graph and between the graphs of
/// successive frames, so they are reference counted and single threaded.
pub type SharedNode = Rc<RefCell<dyn ImageNode>>;

/// One operation in an image graph. Nodes pull images from their inputs,
/// they never push.
pub trait ImageNode {
    /// Short name of the operation, for logs and diagnostics.
    fn label(&self) -> &str;

    fn inputs(&self) -> &[SharedNode];

    fn time_offset(&self) -> RationalTime;

    /// Offset from the timeline's time to this node's local time. The graph
    /// builder sets it on the outermost node of each resolved item.
    fn set_time_offset(&mut self, offset: RationalTime);

    /// Render this node at the given time. Implementations convert the time
    /// to local time once and hand the local time to their inputs.
    fn exec(&mut self, time: RationalTime) -> Result<Image, KinographError>;

    fn local_time(&self, time: RationalTime) -> RationalTime {
        time - self.time_offset()
    }
}

pub fn shared<N: ImageNode + 'static>(node: N) -> SharedNode {
    Rc::new(RefCell::new(node))
}
