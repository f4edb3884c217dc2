pub mod document;
pub mod effect;
pub mod item;
pub mod media;
pub mod time;
pub mod transform;

pub use document::{TimelineDocument, load_timeline};
pub use effect::{CustomEffect, Effect, LinearTimeWarp};
pub use item::{Item, ItemId, ItemKind, Timeline, TrackKind};
pub use media::{
    DEFAULT_MEDIA_KEY, ExternalReference, GeneratorReference, ImageSequenceReference,
    MediaReference, MediaReferences,
};
pub use time::{RationalTime, TimeRange};
