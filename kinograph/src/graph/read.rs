use std::path::PathBuf;

use log::debug;

use crate::error::KinographError;
use crate::graph::node::{ImageNode, SharedNode};
use crate::loader::image::Image;
use crate::loader::sequence;
use crate::model::media::ImageSequenceReference;
use crate::model::time::RationalTime;

/// Reads a single still image. The decoded image is kept for the life of
/// the node, so a node shared across frames decodes once.
pub struct ReadNode {
    path: PathBuf,
    image: Option<Image>,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl ReadNode {
    pub fn new(path: PathBuf) -> ReadNode {
        ReadNode {
            path,
            image: None,
            inputs: Vec::new(),
            time_offset: RationalTime::default(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ImageNode for ReadNode {
    fn label(&self) -> &str {
        "Read"
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

    fn exec(&mut self, _time: RationalTime) -> Result<Image, KinographError> {
        if let Some(image) = &self.image {
            return Ok(image.clone());
        }
        debug!("Reading {}", self.path.display());
        let image = Image::load(&self.path)?;
        self.image = Some(image.clone());
        Ok(image)
    }
}

/// Reads one frame of a numbered image sequence per invocation. Frame zero
/// of local time corresponds to the sequence's start frame.
pub struct SequenceReadNode {
    base: PathBuf,
    name_prefix: String,
    name_suffix: String,
    start_frame: i32,
    frame_step: i32,
    rate: f64,
    frame_zero_padding: usize,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl SequenceReadNode {
    pub fn new(base: PathBuf, reference: &ImageSequenceReference) -> SequenceReadNode {
        SequenceReadNode {
            base,
            name_prefix: reference.name_prefix.clone(),
            name_suffix: reference.name_suffix.clone(),
            start_frame: reference.start_frame,
            frame_step: reference.frame_step,
            rate: reference.rate,
            frame_zero_padding: reference.frame_zero_padding,
            inputs: Vec::new(),
            time_offset: RationalTime::default(),
        }
    }

    fn frame_for(&self, local: RationalTime) -> i64 {
        let elapsed = local.rescaled_to(self.rate).to_frames();
        self.start_frame as i64 + self.frame_step as i64 * elapsed
    }
}

impl ImageNode for SequenceReadNode {
    fn label(&self) -> &str {
        "SequenceRead"
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
        let frame = self.frame_for(local);
        let path = sequence::frame_path(
            &self.base,
            &self.name_prefix,
            frame,
            self.frame_zero_padding,
            &self.name_suffix,
        );
        debug!("Reading sequence frame {}", path.display());
        Image::load(&path)
    }
}
