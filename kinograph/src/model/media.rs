use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::loader::sequence;

/// Key under which a clip's sole media reference is stored when no explicit
/// key is given.
pub const DEFAULT_MEDIA_KEY: &str = "DEFAULT_MEDIA";

fn strip_file_scheme(url: &str) -> &str {
    url.strip_prefix("file://").unwrap_or(url)
}

fn resolve_url(url: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(strip_file_scheme(url));
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// A single still image or movie file on disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExternalReference {
    pub url: String,
}

impl ExternalReference {
    /// Resolve the URL against the directory the timeline was loaded from.
    pub fn resolved_path(&self, base_dir: &Path) -> PathBuf {
        resolve_url(&self.url, base_dir)
    }
}

/// A numbered image sequence, one file per frame.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageSequenceReference {
    pub target_url_base: String,
    #[serde(default)]
    pub name_prefix: String,
    #[serde(default)]
    pub name_suffix: String,
    pub start_frame: i32,
    #[serde(default = "default_frame_step")]
    pub frame_step: i32,
    pub rate: f64,
    #[serde(default)]
    pub frame_zero_padding: usize,
}

fn default_frame_step() -> i32 {
    1
}

impl ImageSequenceReference {
    pub fn resolved_base(&self, base_dir: &Path) -> PathBuf {
        resolve_url(&self.target_url_base, base_dir)
    }

    /// Path of the file holding the given sequence frame number.
    pub fn frame_path(&self, base_dir: &Path, frame: i64) -> PathBuf {
        sequence::frame_path(
            &self.resolved_base(base_dir),
            &self.name_prefix,
            frame,
            self.frame_zero_padding,
            &self.name_suffix,
        )
    }
}

/// Procedurally generated media. The kind names an effect the host can
/// instantiate, the parameters are passed to it as metadata.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeneratorReference {
    pub generator_kind: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum MediaReference {
    #[serde(rename = "ExternalReference")]
    External(ExternalReference),
    #[serde(rename = "ImageSequenceReference")]
    ImageSequence(ImageSequenceReference),
    #[serde(rename = "GeneratorReference")]
    Generator(GeneratorReference),
}

/// A clip's media references, keyed by name, with one marked active.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaReferences {
    references: HashMap<String, MediaReference>,
    active: String,
}

impl MediaReferences {
    /// A single reference stored under [`DEFAULT_MEDIA_KEY`].
    pub fn new(reference: MediaReference) -> MediaReferences {
        let mut references = HashMap::new();
        references.insert(DEFAULT_MEDIA_KEY.to_string(), reference);
        MediaReferences {
            references,
            active: DEFAULT_MEDIA_KEY.to_string(),
        }
    }

    pub fn with_references(
        references: HashMap<String, MediaReference>,
        active: String,
    ) -> MediaReferences {
        MediaReferences { references, active }
    }

    pub fn active(&self) -> Option<&MediaReference> {
        self.references.get(&self.active)
    }

    pub fn active_key(&self) -> &str {
        &self.active
    }

    pub fn set_active(&mut self, key: &str) {
        self.active = key.to_string();
    }

    pub fn insert(&mut self, key: &str, reference: MediaReference) {
        self.references.insert(key.to_string(), reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_url_against_base_dir() {
        let reference = ExternalReference {
            url: "media/slate.png".to_string(),
        };
        let path = reference.resolved_path(Path::new("/projects/demo"));
        assert_eq!(path, PathBuf::from("/projects/demo/media/slate.png"));
    }

    #[test]
    fn test_resolve_absolute_and_file_scheme_urls() {
        let reference = ExternalReference {
            url: "file:///assets/slate.png".to_string(),
        };
        let path = reference.resolved_path(Path::new("/projects/demo"));
        assert_eq!(path, PathBuf::from("/assets/slate.png"));

        let reference = ExternalReference {
            url: "/assets/slate.png".to_string(),
        };
        let path = reference.resolved_path(Path::new("/projects/demo"));
        assert_eq!(path, PathBuf::from("/assets/slate.png"));
    }

    #[test]
    fn test_sequence_frame_path() {
        let reference = ImageSequenceReference {
            target_url_base: "frames".to_string(),
            name_prefix: "shot01.".to_string(),
            name_suffix: ".png".to_string(),
            start_frame: 101,
            frame_step: 1,
            rate: 24.0,
            frame_zero_padding: 4,
        };
        let path = reference.frame_path(Path::new("/projects/demo"), 101);
        assert_eq!(path, PathBuf::from("/projects/demo/frames/shot01.0101.png"));
    }

    #[test]
    fn test_active_reference_selection() {
        let mut media = MediaReferences::new(MediaReference::External(ExternalReference {
            url: "a.png".to_string(),
        }));
        media.insert(
            "proxy",
            MediaReference::External(ExternalReference {
                url: "a_proxy.png".to_string(),
            }),
        );
        assert_eq!(media.active_key(), DEFAULT_MEDIA_KEY);

        media.set_active("proxy");
        match media.active() {
            Some(MediaReference::External(reference)) => {
                assert_eq!(reference.url, "a_proxy.png");
            }
            other => panic!("unexpected active reference: {:?}", other),
        }

        media.set_active("missing");
        assert!(media.active().is_none());
    }

    #[test]
    fn test_media_reference_json_tagging() {
        let json = r#"{
            "type": "GeneratorReference",
            "generator_kind": "kinograph:Fill",
            "parameters": { "size": [16, 8] }
        }"#;
        let reference: MediaReference = serde_json::from_str(json).expect("parse failed");
        match reference {
            MediaReference::Generator(generator) => {
                assert_eq!(generator.generator_kind, "kinograph:Fill");
                assert!(generator.parameters.contains_key("size"));
            }
            other => panic!("unexpected reference: {:?}", other),
        }
    }
}
