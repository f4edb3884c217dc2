use serde_json::{Map, Value};

use crate::error::KinographError;
use crate::graph::node::{ImageNode, SharedNode};
use crate::host::effect_host::metadata_size;
use crate::host::ofx::{
    self, OFX_STATUS_OK, PROP_OUTPUT_IMAGE, PROP_SOURCE_IMAGE, PROP_TIME, RawImage, RenderFn,
};
use crate::host::property_set::PropertySet;
use crate::loader::image::Image;
use crate::model::time::RationalTime;

/// Wraps a render function loaded from a plugin library. Inputs are
/// rendered first, then handed to the plugin through the property bridge
/// along with the effect's metadata.
pub struct PluginEffectNode {
    name: String,
    render: RenderFn,
    metadata: Map<String, Value>,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl PluginEffectNode {
    pub fn new(
        name: &str,
        render: RenderFn,
        metadata: Map<String, Value>,
        inputs: Vec<SharedNode>,
    ) -> PluginEffectNode {
        PluginEffectNode {
            name: name.to_string(),
            render,
            metadata,
            inputs,
            time_offset: RationalTime::default(),
        }
    }
}

/// Copy effect metadata into a property set. Numbers become doubles or
/// ints, bools become ints, strings stay strings, and numeric arrays
/// become multi-value doubles. Anything else is skipped.
fn apply_metadata(set: &mut PropertySet, metadata: &Map<String, Value>) {
    for (key, value) in metadata {
        match value {
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    set.set_int(key, 0, int as i32);
                } else if let Some(float) = number.as_f64() {
                    set.set_double(key, 0, float);
                }
            }
            Value::Bool(flag) => set.set_int(key, 0, *flag as i32),
            Value::String(text) => set.set_string(key, 0, text),
            Value::Array(values) => {
                for (index, element) in values.iter().enumerate() {
                    if let Some(float) = element.as_f64() {
                        set.set_double(key, index, float);
                    }
                }
            }
            _ => {}
        }
    }
}

impl ImageNode for PluginEffectNode {
    fn label(&self) -> &str {
        &self.name
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
        let mut images = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            images.push(input.borrow_mut().exec(local)?);
        }

        // Output matches the first input's size; generator style plugins
        // take theirs from a size parameter.
        let (width, height) = match images.first() {
            Some(image) => (image.width, image.height),
            None => metadata_size(&self.metadata, "size").unwrap_or((0, 0)),
        };
        let mut output = Image::new(width, height);

        let mut in_args = PropertySet::default();
        in_args.set_double(PROP_TIME, 0, local.to_seconds());
        apply_metadata(&mut in_args, &self.metadata);
        let raw_sources: Vec<RawImage> = images.iter_mut().map(RawImage::from_image).collect();
        for (index, raw) in raw_sources.iter().enumerate() {
            in_args.set_pointer(
                PROP_SOURCE_IMAGE,
                index,
                raw as *const RawImage as *mut std::ffi::c_void,
            );
        }

        let mut raw_output = RawImage::from_image(&mut output);
        let mut out_args = PropertySet::default();
        out_args.set_pointer(
            PROP_OUTPUT_IMAGE,
            0,
            &mut raw_output as *mut RawImage as *mut std::ffi::c_void,
        );

        let status = ofx::call_render(self.render, &mut in_args, &mut out_args);
        if status != OFX_STATUS_OK {
            return Err(KinographError::Plugin(format!(
                "effect '{}' failed with status {}",
                self.name, status
            )));
        }
        Ok(output)
    }
}
