use crate::model::item::{ItemId, ItemKind, Timeline};
use crate::model::time::{RationalTime, TimeRange};

impl Timeline {
    /// The range an item occupies on its parent's local timeline.
    ///
    /// Children of a stack are parallel: each starts at the stack's own
    /// start time. Children of a track are sequential: each starts after
    /// the cumulative duration of its preceding siblings. The root's child
    /// range is its own range.
    pub fn child_range(&self, id: ItemId) -> TimeRange {
        let item = self.item(id);
        let Some(parent_id) = item.parent() else {
            return item.range;
        };
        let parent = self.item(parent_id);
        match &parent.kind {
            ItemKind::Stack { .. } => {
                TimeRange::new(parent.range.start_time(), item.range.duration())
            }
            ItemKind::Track { children, .. } => {
                let mut start = parent.range.start_time();
                for &child_id in children {
                    if child_id == id {
                        break;
                    }
                    start = start + self.item(child_id).range.duration();
                }
                TimeRange::new(start, item.range.duration())
            }
            _ => item.range,
        }
    }

    /// Convert a time from one item's local coordinate space to another's.
    ///
    /// Both items must belong to this timeline. Walking up a level replaces
    /// the item's own placement with the placement its parent computes for
    /// it; walking down applies the inverse.
    pub fn transform_time(&self, time: RationalTime, from: ItemId, to: ItemId) -> RationalTime {
        if from == to {
            return time;
        }

        let mut result = time;
        let mut ancestor = from;
        while ancestor != to {
            let item = self.item(ancestor);
            let Some(parent) = item.parent() else { break };
            result = result - item.range.start_time() + self.child_range(ancestor).start_time();
            ancestor = parent;
        }
        if ancestor == to {
            return result;
        }

        // `to` is not an ancestor of `from`. The downward steps are pure
        // offsets, so they can be applied in any order.
        let mut current = to;
        while current != ancestor {
            let item = self.item(current);
            let Some(parent) = item.parent() else { break };
            result = result + item.range.start_time() - self.child_range(current).start_time();
            current = parent;
        }
        result
    }

    pub fn transform_range(&self, range: TimeRange, from: ItemId, to: ItemId) -> TimeRange {
        TimeRange::new(
            self.transform_time(range.start_time(), from, to),
            range.duration(),
        )
    }
}
