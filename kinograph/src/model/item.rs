use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::KinographError;
use crate::model::effect::Effect;
use crate::model::media::MediaReferences;
use crate::model::time::{RationalTime, TimeRange};

/// Index of an item in the arena of the [`Timeline`] that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemId(usize);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum ItemKind {
    Stack {
        children: Vec<ItemId>,
    },
    Track {
        kind: TrackKind,
        children: Vec<ItemId>,
    },
    Clip {
        media: MediaReferences,
    },
    Gap,
    Transition {
        transition_type: String,
        in_offset: RationalTime,
        out_offset: RationalTime,
    },
}

impl ItemKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ItemKind::Stack { .. } => "Stack",
            ItemKind::Track { .. } => "Track",
            ItemKind::Clip { .. } => "Clip",
            ItemKind::Gap => "Gap",
            ItemKind::Transition { .. } => "Transition",
        }
    }
}

/// One node of the timeline tree. The range places the item on its parent's
/// local timeline.
#[derive(Clone, Debug)]
pub struct Item {
    pub name: String,
    pub range: TimeRange,
    pub metadata: Map<String, Value>,
    pub effects: Vec<Effect>,
    pub kind: ItemKind,
    parent: Option<ItemId>,
}

impl Item {
    fn new(name: &str, range: TimeRange, kind: ItemKind) -> Item {
        Item {
            name: name.to_string(),
            range,
            metadata: Map::new(),
            effects: Vec::new(),
            kind,
            parent: None,
        }
    }

    pub fn stack(name: &str, range: TimeRange) -> Item {
        Item::new(name, range, ItemKind::Stack { children: Vec::new() })
    }

    pub fn track(name: &str, range: TimeRange, kind: TrackKind) -> Item {
        Item::new(
            name,
            range,
            ItemKind::Track {
                kind,
                children: Vec::new(),
            },
        )
    }

    pub fn clip(name: &str, range: TimeRange, media: MediaReferences) -> Item {
        Item::new(name, range, ItemKind::Clip { media })
    }

    pub fn gap(name: &str, range: TimeRange) -> Item {
        Item::new(name, range, ItemKind::Gap)
    }

    /// Transitions occupy no time of their own. Their range is empty and
    /// sits at the cut between the two neighboring items.
    pub fn transition(
        name: &str,
        transition_type: &str,
        in_offset: RationalTime,
        out_offset: RationalTime,
    ) -> Item {
        let zero = RationalTime::new(0.0, in_offset.rate());
        Item::new(
            name,
            TimeRange::new(zero, zero),
            ItemKind::Transition {
                transition_type: transition_type.to_string(),
                in_offset,
                out_offset,
            },
        )
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn child_ids(&self) -> &[ItemId] {
        match &self.kind {
            ItemKind::Stack { children } => children,
            ItemKind::Track { children, .. } => children,
            _ => &[],
        }
    }
}

/// A timeline and the arena holding all of its items. The root is always a
/// stack whose children are tracks, composited bottom to top.
#[derive(Clone, Debug)]
pub struct Timeline {
    name: String,
    global_start_time: Option<RationalTime>,
    base_dir: PathBuf,
    items: Vec<Item>,
    root: ItemId,
}

impl Timeline {
    pub fn new(name: &str, range: TimeRange) -> Timeline {
        let root_item = Item::stack("stack", range);
        Timeline {
            name: name.to_string(),
            global_start_time: None,
            base_dir: PathBuf::from("."),
            items: vec![root_item],
            root: ItemId(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> ItemId {
        self.root
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.0]
    }

    pub fn item_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.items[id.0]
    }

    /// Total duration of the root stack.
    pub fn duration(&self) -> RationalTime {
        self.item(self.root).range.duration()
    }

    pub fn global_start_time(&self) -> Option<RationalTime> {
        self.global_start_time
    }

    pub fn set_global_start_time(&mut self, time: Option<RationalTime>) {
        self.global_start_time = time;
    }

    /// Directory media URLs are resolved against, normally the directory
    /// the timeline document was loaded from.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn set_base_dir(&mut self, dir: &Path) {
        self.base_dir = dir.to_path_buf();
    }

    pub fn children(&self, id: ItemId) -> &[ItemId] {
        self.item(id).child_ids()
    }

    /// Append an item to a container, returning the new item's id.
    pub fn add_child(&mut self, parent: ItemId, mut item: Item) -> Result<ItemId, KinographError> {
        let id = ItemId(self.items.len());
        item.parent = Some(parent);
        let parent_item = &mut self.items[parent.0];
        match &mut parent_item.kind {
            ItemKind::Stack { children } => children.push(id),
            ItemKind::Track { children, .. } => children.push(id),
            other => {
                return Err(KinographError::Timeline(format!(
                    "cannot add a child to a {}",
                    other.type_name()
                )));
            }
        }
        self.items.push(item);
        Ok(id)
    }
}
