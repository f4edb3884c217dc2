use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::KinographError;
use crate::model::effect::Effect;
use crate::model::item::{Item, ItemId, Timeline, TrackKind};
use crate::model::media::{DEFAULT_MEDIA_KEY, MediaReference, MediaReferences};
use crate::model::time::{RationalTime, TimeRange};

/// Serialized form of a timeline. The root stack carries the overall range;
/// every other item is nested under it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TimelineDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub global_start_time: Option<RationalTime>,
    pub stack: ItemDocument,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type")]
pub enum ItemDocument {
    Stack(ContainerDocument),
    Track(TrackDocument),
    Clip(ClipDocument),
    Gap(LeafDocument),
    Transition(TransitionDocument),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ContainerDocument {
    #[serde(default)]
    pub name: String,
    pub range: TimeRange,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub children: Vec<ItemDocument>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TrackDocument {
    #[serde(default)]
    pub name: String,
    pub range: TimeRange,
    #[serde(default = "default_track_kind")]
    pub kind: TrackKind,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub children: Vec<ItemDocument>,
}

fn default_track_kind() -> TrackKind {
    TrackKind::Video
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ClipDocument {
    #[serde(default)]
    pub name: String,
    pub range: TimeRange,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    pub media_references: HashMap<String, MediaReference>,
    #[serde(default = "default_media_key")]
    pub active_media_reference: String,
}

fn default_media_key() -> String {
    DEFAULT_MEDIA_KEY.to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LeafDocument {
    #[serde(default)]
    pub name: String,
    pub range: TimeRange,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransitionDocument {
    #[serde(default)]
    pub name: String,
    pub transition_type: String,
    pub in_offset: RationalTime,
    pub out_offset: RationalTime,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Read a timeline document from disk. The document's directory becomes the
/// timeline's base directory for media resolution.
pub fn load_timeline(path: &Path) -> Result<Timeline, KinographError> {
    let text = std::fs::read_to_string(path)?;
    let document: TimelineDocument = serde_json::from_str(&text)?;
    let mut timeline = Timeline::from_document(&document)?;
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            timeline.set_base_dir(dir);
        }
    }
    log::debug!(
        "Loaded timeline '{}' from {}",
        timeline.name(),
        path.display()
    );
    Ok(timeline)
}

impl Timeline {
    pub fn from_document(document: &TimelineDocument) -> Result<Timeline, KinographError> {
        let ItemDocument::Stack(stack) = &document.stack else {
            return Err(KinographError::Timeline(
                "timeline root must be a Stack".to_string(),
            ));
        };
        check_range(&stack.range, &stack.name)?;

        let mut timeline = Timeline::new(&document.name, stack.range);
        timeline.set_global_start_time(document.global_start_time);
        let root = timeline.root();
        {
            let item = timeline.item_mut(root);
            item.name = stack.name.clone();
            item.metadata = stack.metadata.clone();
            item.effects = stack.effects.clone();
        }
        for child in &stack.children {
            build_item(&mut timeline, root, child)?;
        }
        Ok(timeline)
    }
}

fn build_item(
    timeline: &mut Timeline,
    parent: ItemId,
    document: &ItemDocument,
) -> Result<(), KinographError> {
    match document {
        ItemDocument::Stack(stack) => {
            check_range(&stack.range, &stack.name)?;
            let mut item = Item::stack(&stack.name, stack.range);
            item.metadata = stack.metadata.clone();
            item.effects = stack.effects.clone();
            let id = timeline.add_child(parent, item)?;
            for child in &stack.children {
                build_item(timeline, id, child)?;
            }
        }
        ItemDocument::Track(track) => {
            check_range(&track.range, &track.name)?;
            let mut item = Item::track(&track.name, track.range, track.kind);
            item.metadata = track.metadata.clone();
            item.effects = track.effects.clone();
            let id = timeline.add_child(parent, item)?;
            for child in &track.children {
                build_item(timeline, id, child)?;
            }
        }
        ItemDocument::Clip(clip) => {
            check_range(&clip.range, &clip.name)?;
            check_media(&clip.media_references, &clip.name)?;
            let media = MediaReferences::with_references(
                clip.media_references.clone(),
                clip.active_media_reference.clone(),
            );
            let mut item = Item::clip(&clip.name, clip.range, media);
            item.metadata = clip.metadata.clone();
            item.effects = clip.effects.clone();
            timeline.add_child(parent, item)?;
        }
        ItemDocument::Gap(gap) => {
            check_range(&gap.range, &gap.name)?;
            let mut item = Item::gap(&gap.name, gap.range);
            item.metadata = gap.metadata.clone();
            item.effects = gap.effects.clone();
            timeline.add_child(parent, item)?;
        }
        ItemDocument::Transition(transition) => {
            check_time(&transition.in_offset, &transition.name)?;
            check_time(&transition.out_offset, &transition.name)?;
            let mut item = Item::transition(
                &transition.name,
                &transition.transition_type,
                transition.in_offset,
                transition.out_offset,
            );
            item.metadata = transition.metadata.clone();
            timeline.add_child(parent, item)?;
        }
    }
    Ok(())
}

fn check_time(time: &RationalTime, name: &str) -> Result<(), KinographError> {
    if time.rate() > 0.0 && time.rate().is_finite() {
        Ok(())
    } else {
        Err(KinographError::Timeline(format!(
            "item '{}' has a non-positive rate",
            name
        )))
    }
}

fn check_range(range: &TimeRange, name: &str) -> Result<(), KinographError> {
    check_time(&range.start_time(), name)?;
    check_time(&range.duration(), name)
}

fn check_media(
    references: &HashMap<String, MediaReference>,
    name: &str,
) -> Result<(), KinographError> {
    for reference in references.values() {
        if let MediaReference::ImageSequence(sequence) = reference {
            if !(sequence.rate > 0.0 && sequence.rate.is_finite()) {
                return Err(KinographError::Timeline(format!(
                    "image sequence on clip '{}' has a non-positive rate",
                    name
                )));
            }
        }
    }
    Ok(())
}
