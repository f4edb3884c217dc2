use std::num::NonZeroUsize;
use std::rc::Rc;

use log::{debug, warn};
use lru::LruCache;
use serde_json::Value;

use crate::graph::composite::CompositeNode;
use crate::graph::generator::FillNode;
use crate::graph::node::{SharedNode, shared};
use crate::graph::read::{ReadNode, SequenceReadNode};
use crate::graph::time_warp::LinearTimeWarpNode;
use crate::graph::transition::DissolveNode;
use crate::host::effect_host::{ImageEffectHost, metadata_size};
use crate::loader::color::Color;
use crate::loader::image::Image;
use crate::model::effect::Effect;
use crate::model::item::{ItemId, ItemKind, Timeline, TrackKind};
use crate::model::media::MediaReference;
use crate::model::time::{RationalTime, TimeRange};

const LOAD_CACHE_SIZE: usize = 256;

/// Builds the image graph for any time of a timeline.
///
/// The builder walks the timeline top down for the requested time and
/// returns the root node of a lazy graph; nothing is rendered until the
/// caller executes that node. Still image read nodes are shared between
/// frames through a bounded cache, keyed by resolved path.
pub struct ImageGraph {
    timeline: Rc<Timeline>,
    image_size: (u32, u32),
    load_cache: LruCache<String, SharedNode>,
}

impl ImageGraph {
    pub fn new(timeline: Rc<Timeline>) -> ImageGraph {
        let image_size = probe_image_size(&timeline);
        if image_size.0 == 0 || image_size.1 == 0 {
            warn!(
                "Timeline '{}' has no media with a determinable size",
                timeline.name()
            );
        } else {
            debug!("Timeline image size is {}x{}", image_size.0, image_size.1);
        }
        let capacity = NonZeroUsize::new(LOAD_CACHE_SIZE).expect("LOAD_CACHE_SIZE must be > 0");
        ImageGraph {
            timeline,
            image_size,
            load_cache: LruCache::new(capacity),
        }
    }

    /// Size all frames of this timeline are rendered at, taken from the
    /// first clip whose media reports one.
    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    /// Build the graph for one time in the root stack's coordinate space.
    ///
    /// Video tracks are composited in order over an opaque black
    /// background; a track whose current item resolves to nothing leaves
    /// the frame unchanged.
    pub fn exec(&mut self, host: &mut ImageEffectHost, time: RationalTime) -> SharedNode {
        let timeline = Rc::clone(&self.timeline);
        let root = timeline.root();
        let mut node: SharedNode = shared(FillNode::new(self.image_size, Color::BLACK));
        for &track_id in timeline.children(root) {
            let track = timeline.item(track_id);
            let is_video = matches!(
                track.kind,
                ItemKind::Track {
                    kind: TrackKind::Video,
                    ..
                }
            );
            if !is_video {
                continue;
            }
            let track_time = timeline.transform_time(time, root, track_id);
            if let Some(track_node) = self.resolve_track(host, track_time, track_id) {
                let track_node = apply_effects(host, &track.effects, track_node);
                node = shared(CompositeNode::new(vec![node, track_node], true));
            }
        }
        let stack = timeline.item(root);
        apply_effects(host, &stack.effects, node)
    }

    /// Resolve a track at a time in the track's own coordinate space.
    fn resolve_track(
        &mut self,
        host: &mut ImageEffectHost,
        time: RationalTime,
        track_id: ItemId,
    ) -> Option<SharedNode> {
        let timeline = Rc::clone(&self.timeline);
        let children = timeline.children(track_id);

        let mut found = None;
        for (index, &child_id) in children.iter().enumerate() {
            if is_transition(&timeline, child_id) {
                continue;
            }
            if timeline.child_range(child_id).contains(time) {
                found = Some(index);
                break;
            }
        }
        let index = found?;
        let item_id = children[index];
        let node = self.resolve_item(host, item_id)?;

        // A window straddling the previous cut wins over one at the next
        // cut when both contain the time.
        if index >= 2 {
            let transition_id = children[index - 1];
            let outgoing_id = children[index - 2];
            if is_transition(&timeline, transition_id) && !is_transition(&timeline, outgoing_id) {
                if let Some(value) = transition_value(&timeline, time, transition_id) {
                    if let Some(outgoing) = self.resolve_item(host, outgoing_id) {
                        return Some(transition_node(
                            host,
                            &timeline,
                            transition_id,
                            value,
                            outgoing,
                            node,
                        ));
                    }
                }
            }
        }
        if index + 2 < children.len() {
            let transition_id = children[index + 1];
            let incoming_id = children[index + 2];
            if is_transition(&timeline, transition_id) && !is_transition(&timeline, incoming_id) {
                if let Some(value) = transition_value(&timeline, time, transition_id) {
                    if let Some(incoming) = self.resolve_item(host, incoming_id) {
                        return Some(transition_node(
                            host,
                            &timeline,
                            transition_id,
                            value,
                            node,
                            incoming,
                        ));
                    }
                }
            }
        }
        Some(node)
    }

    /// Resolve one clip or gap into its node chain: media node, then the
    /// item's effects, then the time offset on the outermost node.
    fn resolve_item(&mut self, host: &mut ImageEffectHost, item_id: ItemId) -> Option<SharedNode> {
        let timeline = Rc::clone(&self.timeline);
        let item = timeline.item(item_id);
        let node = match &item.kind {
            ItemKind::Clip { media } => {
                let Some(reference) = media.active() else {
                    warn!("Clip '{}' has no active media reference", item.name);
                    return None;
                };
                match reference {
                    MediaReference::External(external) => {
                        let path = external.resolved_path(timeline.base_dir());
                        let key = path.to_string_lossy().into_owned();
                        if let Some(cached) = self.load_cache.get(&key) {
                            debug!("Sharing read node for {}", key);
                            // The shared node may still carry the offset of
                            // the item that used it last.
                            cached.borrow_mut().set_time_offset(RationalTime::default());
                            Rc::clone(cached)
                        } else {
                            let node = shared(ReadNode::new(path));
                            self.load_cache.put(key, Rc::clone(&node));
                            node
                        }
                    }
                    MediaReference::ImageSequence(sequence) => shared(SequenceReadNode::new(
                        sequence.resolved_base(timeline.base_dir()),
                        sequence,
                    )),
                    MediaReference::Generator(generator) => {
                        let node = host.create_node(
                            &generator.generator_kind,
                            &generator.parameters,
                            Vec::new(),
                        );
                        match node {
                            Some(node) => node,
                            None => {
                                warn!("Generator '{}' not found", generator.generator_kind);
                                return None;
                            }
                        }
                    }
                }
            }
            ItemKind::Gap => shared(FillNode::new(self.image_size, Color::TRANSPARENT)),
            other => {
                debug!("Cannot resolve a {} inside a track", other.type_name());
                return None;
            }
        };
        let node = apply_effects(host, &item.effects, node);
        let offset = timeline.transform_time(item.range.start_time(), item_id, timeline.root());
        node.borrow_mut().set_time_offset(offset);
        Some(node)
    }
}

fn is_transition(timeline: &Timeline, id: ItemId) -> bool {
    matches!(timeline.item(id).kind, ItemKind::Transition { .. })
}

/// Blend amount for a transition at a time in the track's space, if the
/// time falls inside the transition's window around its cut point.
fn transition_value(timeline: &Timeline, time: RationalTime, transition_id: ItemId) -> Option<f64> {
    let item = timeline.item(transition_id);
    let ItemKind::Transition {
        in_offset,
        out_offset,
        ..
    } = &item.kind
    else {
        return None;
    };
    let cut = timeline.child_range(transition_id).start_time();
    let window = TimeRange::new(cut - *in_offset, *in_offset + *out_offset);
    if !window.contains(time) {
        return None;
    }
    Some((time - window.start_time()).to_seconds() / window.duration().to_seconds())
}

fn transition_node(
    host: &mut ImageEffectHost,
    timeline: &Timeline,
    transition_id: ItemId,
    value: f64,
    outgoing: SharedNode,
    incoming: SharedNode,
) -> SharedNode {
    let item = timeline.item(transition_id);
    let ItemKind::Transition {
        transition_type, ..
    } = &item.kind
    else {
        return shared(DissolveNode::new(value, outgoing, incoming));
    };
    let mut metadata = item.metadata.clone();
    metadata.insert("value".to_string(), Value::from(value));
    let inputs = vec![Rc::clone(&outgoing), Rc::clone(&incoming)];
    match host.create_node(transition_type, &metadata, inputs) {
        Some(node) => node,
        None => {
            warn!(
                "Transition '{}' not found, falling back to a dissolve",
                transition_type
            );
            shared(DissolveNode::new(value, outgoing, incoming))
        }
    }
}

fn apply_effects(host: &mut ImageEffectHost, effects: &[Effect], node: SharedNode) -> SharedNode {
    let mut node = node;
    for effect in effects {
        match effect {
            Effect::LinearTimeWarp(warp) => {
                node = shared(LinearTimeWarpNode::new(warp.time_scalar, node));
            }
            Effect::Custom(custom) => {
                let inputs = vec![Rc::clone(&node)];
                match host.create_node(&custom.effect_name, &custom.metadata, inputs) {
                    Some(wrapped) => node = wrapped,
                    None => warn!("Effect '{}' not found", custom.effect_name),
                }
            }
        }
    }
    node
}

fn probe_image_size(timeline: &Timeline) -> (u32, u32) {
    probe_item(timeline, timeline.root()).unwrap_or((0, 0))
}

/// Depth first search for the first clip whose media yields a size.
fn probe_item(timeline: &Timeline, id: ItemId) -> Option<(u32, u32)> {
    let item = timeline.item(id);
    match &item.kind {
        ItemKind::Stack { .. } | ItemKind::Track { .. } => timeline
            .children(id)
            .iter()
            .find_map(|&child| probe_item(timeline, child)),
        ItemKind::Clip { media } => probe_media(timeline, media.active()?, &item.name),
        _ => None,
    }
}

fn probe_media(
    timeline: &Timeline,
    reference: &MediaReference,
    clip_name: &str,
) -> Option<(u32, u32)> {
    match reference {
        MediaReference::External(external) => {
            let path = external.resolved_path(timeline.base_dir());
            match Image::dimensions(&path) {
                Ok(size) => Some(size),
                Err(error) => {
                    debug!(
                        "Cannot probe {} for clip '{}': {}",
                        path.display(),
                        clip_name,
                        error
                    );
                    None
                }
            }
        }
        MediaReference::ImageSequence(sequence) => {
            let path = sequence.frame_path(timeline.base_dir(), sequence.start_frame as i64);
            match Image::dimensions(&path) {
                Ok(size) => Some(size),
                Err(error) => {
                    debug!(
                        "Cannot probe {} for clip '{}': {}",
                        path.display(),
                        clip_name,
                        error
                    );
                    None
                }
            }
        }
        MediaReference::Generator(generator) => metadata_size(&generator.parameters, "size"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::Item;
    use crate::model::media::{GeneratorReference, MediaReferences};
    use serde_json::json;

    fn frames(start: f64, duration: f64) -> TimeRange {
        TimeRange::new(
            RationalTime::new(start, 24.0),
            RationalTime::new(duration, 24.0),
        )
    }

    fn fill_clip(name: &str, range: TimeRange, size: (u32, u32), color: [f64; 4]) -> Item {
        let reference = MediaReference::Generator(GeneratorReference {
            generator_kind: "kinograph:Fill".to_string(),
            parameters: match json!({ "size": [size.0, size.1], "color": color }) {
                Value::Object(map) => map,
                _ => unreachable!(),
            },
        });
        Item::clip(name, range, MediaReferences::new(reference))
    }

    #[test]
    fn test_image_size_probed_from_generator_parameters() {
        let mut timeline = Timeline::new("test", frames(0.0, 48.0));
        let root = timeline.root();
        let track = timeline
            .add_child(root, Item::track("v1", frames(0.0, 48.0), TrackKind::Video))
            .expect("add track failed");
        timeline
            .add_child(
                track,
                fill_clip("red", frames(0.0, 48.0), (64, 36), [1.0, 0.0, 0.0, 1.0]),
            )
            .expect("add clip failed");

        let graph = ImageGraph::new(Rc::new(timeline));
        assert_eq!(graph.image_size(), (64, 36));
    }

    #[test]
    fn test_empty_timeline_probes_to_zero() {
        let timeline = Timeline::new("empty", frames(0.0, 48.0));
        let graph = ImageGraph::new(Rc::new(timeline));
        assert_eq!(graph.image_size(), (0, 0));
    }

    #[test]
    fn test_audio_tracks_are_skipped() {
        let mut timeline = Timeline::new("test", frames(0.0, 48.0));
        let root = timeline.root();
        let video = timeline
            .add_child(root, Item::track("v1", frames(0.0, 48.0), TrackKind::Video))
            .expect("add track failed");
        timeline
            .add_child(
                video,
                fill_clip("red", frames(0.0, 48.0), (8, 8), [1.0, 0.0, 0.0, 1.0]),
            )
            .expect("add clip failed");
        let audio = timeline
            .add_child(root, Item::track("a1", frames(0.0, 48.0), TrackKind::Audio))
            .expect("add track failed");
        timeline
            .add_child(
                audio,
                fill_clip("blue", frames(0.0, 48.0), (8, 8), [0.0, 0.0, 1.0, 1.0]),
            )
            .expect("add clip failed");

        let mut host = ImageEffectHost::new(&[]);
        let mut graph = ImageGraph::new(Rc::new(timeline));
        let node = graph.exec(&mut host, RationalTime::new(12.0, 24.0));
        let image = node
            .borrow_mut()
            .exec(RationalTime::new(12.0, 24.0))
            .expect("exec failed");
        // Only the video track contributes.
        assert_eq!(image.pixel(4, 4), Color::new(255, 0, 0, 255));
    }

    #[test]
    fn test_gap_leaves_the_background() {
        let mut timeline = Timeline::new("test", frames(0.0, 48.0));
        let root = timeline.root();
        let track = timeline
            .add_child(root, Item::track("v1", frames(0.0, 48.0), TrackKind::Video))
            .expect("add track failed");
        timeline
            .add_child(track, Item::gap("gap", frames(0.0, 24.0)))
            .expect("add gap failed");
        timeline
            .add_child(
                track,
                fill_clip("red", frames(24.0, 24.0), (8, 8), [1.0, 0.0, 0.0, 1.0]),
            )
            .expect("add clip failed");

        let mut host = ImageEffectHost::new(&[]);
        let mut graph = ImageGraph::new(Rc::new(timeline));

        let time = RationalTime::new(6.0, 24.0);
        let image = graph
            .exec(&mut host, time)
            .borrow_mut()
            .exec(time)
            .expect("exec failed");
        assert_eq!(image.pixel(2, 2), Color::BLACK);

        let time = RationalTime::new(30.0, 24.0);
        let image = graph
            .exec(&mut host, time)
            .borrow_mut()
            .exec(time)
            .expect("exec failed");
        assert_eq!(image.pixel(2, 2), Color::new(255, 0, 0, 255));
    }

    #[test]
    fn test_outside_all_items_only_background_remains() {
        let mut timeline = Timeline::new("test", frames(0.0, 96.0));
        let root = timeline.root();
        let track = timeline
            .add_child(root, Item::track("v1", frames(0.0, 96.0), TrackKind::Video))
            .expect("add track failed");
        timeline
            .add_child(
                track,
                fill_clip("red", frames(0.0, 24.0), (4, 4), [1.0, 0.0, 0.0, 1.0]),
            )
            .expect("add clip failed");

        let mut host = ImageEffectHost::new(&[]);
        let mut graph = ImageGraph::new(Rc::new(timeline));
        let time = RationalTime::new(48.0, 24.0);
        let image = graph
            .exec(&mut host, time)
            .borrow_mut()
            .exec(time)
            .expect("exec failed");
        assert_eq!(image.pixel(0, 0), Color::BLACK);
        assert_eq!(image.pixel(3, 3), Color::BLACK);
    }
}
