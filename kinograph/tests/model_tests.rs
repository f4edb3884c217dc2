use std::path::Path;

use kinograph::model::document::{self, ItemDocument, TimelineDocument};
use kinograph::model::item::{ItemKind, TrackKind};
use kinograph::model::media::MediaReference;
use kinograph::model::time::RationalTime;
use kinograph::model::{Effect, Timeline};
use serde_json::json;

fn time(value: f64) -> serde_json::Value {
    json!({ "value": value, "rate": 24.0 })
}

fn range(start: f64, duration: f64) -> serde_json::Value {
    json!({ "start_time": time(start), "duration": time(duration) })
}

fn demo_document() -> serde_json::Value {
    json!({
        "name": "demo",
        "global_start_time": time(86400.0),
        "stack": {
            "type": "Stack",
            "name": "stack",
            "range": range(0.0, 120.0),
            "children": [
                {
                    "type": "Track",
                    "name": "v1",
                    "kind": "video",
                    "range": range(0.0, 120.0),
                    "children": [
                        {
                            "type": "Clip",
                            "name": "slate",
                            "range": range(0.0, 48.0),
                            "effects": [
                                { "kind": "LinearTimeWarp", "time_scalar": 2.0 }
                            ],
                            "media_references": {
                                "DEFAULT_MEDIA": {
                                    "type": "ExternalReference",
                                    "url": "media/slate.png"
                                },
                                "proxy": {
                                    "type": "ImageSequenceReference",
                                    "target_url_base": "proxy/",
                                    "name_prefix": "slate.",
                                    "name_suffix": ".png",
                                    "start_frame": 1,
                                    "rate": 24.0,
                                    "frame_zero_padding": 4
                                }
                            }
                        },
                        {
                            "type": "Transition",
                            "name": "mix",
                            "transition_type": "kinograph:Wipe",
                            "in_offset": time(6.0),
                            "out_offset": time(6.0),
                            "metadata": { "dir": "ltr", "soft_edge": 0.1 }
                        },
                        {
                            "type": "Clip",
                            "name": "card",
                            "range": range(48.0, 72.0),
                            "media_references": {
                                "DEFAULT_MEDIA": {
                                    "type": "GeneratorReference",
                                    "generator_kind": "kinograph:Checkers",
                                    "parameters": { "size": [64, 36] }
                                }
                            }
                        }
                    ]
                },
                {
                    "type": "Track",
                    "name": "a1",
                    "kind": "audio",
                    "range": range(0.0, 120.0),
                    "children": [
                        { "type": "Gap", "name": "silence", "range": range(0.0, 120.0) }
                    ]
                }
            ]
        }
    })
}

#[test]
fn test_document_roundtrip() {
    // Parse, serialize, parse again; the rebuilt timeline must match.
    let parsed: TimelineDocument =
        serde_json::from_value(demo_document()).expect("Failed to parse document");
    let serialized = serde_json::to_string(&parsed).expect("Failed to serialize document");
    println!("Serialized JSON: {}", serialized);
    let reparsed: TimelineDocument =
        serde_json::from_str(&serialized).expect("Failed to reparse document");

    let first = Timeline::from_document(&parsed).expect("Failed to build timeline");
    let second = Timeline::from_document(&reparsed).expect("Failed to build timeline");
    assert_eq!(first.name(), second.name());
    assert_eq!(first.duration(), second.duration());
    assert_eq!(
        first.children(first.root()).len(),
        second.children(second.root()).len()
    );
}

#[test]
fn test_document_builds_expected_structure() {
    let parsed: TimelineDocument =
        serde_json::from_value(demo_document()).expect("Failed to parse document");
    let timeline = Timeline::from_document(&parsed).expect("Failed to build timeline");

    assert_eq!(timeline.name(), "demo");
    assert_eq!(
        timeline.global_start_time(),
        Some(RationalTime::new(86400.0, 24.0))
    );

    let root = timeline.root();
    let tracks = timeline.children(root);
    assert_eq!(tracks.len(), 2);

    let video = timeline.item(tracks[0]);
    assert!(matches!(
        video.kind,
        ItemKind::Track {
            kind: TrackKind::Video,
            ..
        }
    ));

    let children = timeline.children(tracks[0]);
    assert_eq!(children.len(), 3);

    // Clip with two media references, the default one active.
    let slate = timeline.item(children[0]);
    let ItemKind::Clip { media } = &slate.kind else {
        panic!("expected a clip");
    };
    assert!(matches!(media.active(), Some(MediaReference::External(_))));
    assert_eq!(slate.effects.len(), 1);
    assert!(matches!(slate.effects[0], Effect::LinearTimeWarp(_)));

    // Transition metadata is preserved for the effect host.
    let mix = timeline.item(children[1]);
    assert_eq!(mix.metadata.get("dir"), Some(&json!("ltr")));

    // The zero duration transition does not push the next clip out.
    assert_eq!(
        timeline.child_range(children[2]).start_time(),
        RationalTime::new(48.0, 24.0)
    );
}

#[test]
fn test_transform_roundtrip_on_document_timeline() {
    let parsed: TimelineDocument =
        serde_json::from_value(demo_document()).expect("Failed to parse document");
    let timeline = Timeline::from_document(&parsed).expect("Failed to build timeline");

    let root = timeline.root();
    let video = timeline.children(root)[0];
    let card = timeline.children(video)[2];

    for value in [48.0, 60.0, 119.0] {
        let stack_time = RationalTime::new(value, 24.0);
        let local = timeline.transform_time(stack_time, root, card);
        let back = timeline.transform_time(local, card, root);
        assert_eq!(back, stack_time);
    }
}

#[test]
fn test_load_timeline_sets_base_dir() {
    let dir = std::env::temp_dir().join(format!("kinograph_model_tests_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("Failed to create test directory");
    let path = dir.join("timeline.json");
    std::fs::write(&path, demo_document().to_string()).expect("Failed to write document");

    let timeline = document::load_timeline(&path).expect("Failed to load timeline");
    assert_eq!(timeline.base_dir(), dir.as_path());

    let video = timeline.children(timeline.root())[0];
    let slate = timeline.item(timeline.children(video)[0]);
    let ItemKind::Clip { media } = &slate.kind else {
        panic!("expected a clip");
    };
    let Some(MediaReference::External(reference)) = media.active() else {
        panic!("expected an external reference");
    };
    assert_eq!(
        reference.resolved_path(timeline.base_dir()),
        dir.join("media/slate.png")
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_malformed_document_is_a_json_error() {
    let result: Result<TimelineDocument, _> = serde_json::from_str("{ \"name\": \"broken\" }");
    assert!(result.is_err());

    let result: Result<ItemDocument, _> =
        serde_json::from_value(json!({ "type": "Reel", "range": range(0.0, 1.0) }));
    assert!(result.is_err());
}

#[test]
fn test_missing_file_is_an_io_error() {
    let missing = Path::new("/nonexistent/kinograph/timeline.json");
    let result = document::load_timeline(missing);
    assert!(matches!(
        result,
        Err(kinograph::KinographError::Io(_))
    ));
}
