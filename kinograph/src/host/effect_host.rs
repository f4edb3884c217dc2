use std::collections::HashMap;
use std::path::{Path, PathBuf};

use libloading::Library;
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::graph::generator::{CheckersNode, FillNode, GradientNode};
use crate::graph::node::{SharedNode, shared};
use crate::graph::plugin::PluginEffectNode;
use crate::graph::transition::{DissolveNode, WipeDir, WipeNode};
use crate::host::ofx::{self, LoadedEffect, RenderFn};
use crate::loader::color::Color;

pub const PLUGIN_PATH_ENV: &str = "KINOGRAPH_PLUGIN_PATH";

pub const FILL_EFFECT: &str = "kinograph:Fill";
pub const CHECKERS_EFFECT: &str = "kinograph:Checkers";
pub const GRADIENT_EFFECT: &str = "kinograph:Gradient";
pub const DISSOLVE_EFFECT: &str = "kinograph:Dissolve";
pub const WIPE_EFFECT: &str = "kinograph:Wipe";

const BUILTIN_EFFECTS: [&str; 5] = [
    FILL_EFFECT,
    CHECKERS_EFFECT,
    GRADIENT_EFFECT,
    DISSOLVE_EFFECT,
    WIPE_EFFECT,
];

struct PluginCandidate {
    path: PathBuf,
    loaded: bool,
}

/// Creates image nodes by effect name. Built-in effects are matched
/// directly; any other name is looked up in the plugin libraries found on
/// the search paths.
///
/// Libraries are only opened once an unknown name actually has to be
/// resolved, and stay loaded for the life of the host.
pub struct ImageEffectHost {
    candidates: Vec<PluginCandidate>,
    effects: HashMap<String, LoadedEffect>,
    libraries: Vec<Library>,
}

impl ImageEffectHost {
    pub fn new(search_paths: &[PathBuf]) -> ImageEffectHost {
        let mut candidates = Vec::new();
        for dir in search_paths {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(error) => {
                    warn!("Cannot read plugin directory {}: {}", dir.display(), error);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let extension = path.extension().and_then(|extension| extension.to_str());
                if extension == Some(std::env::consts::DLL_EXTENSION) {
                    candidates.push(PluginCandidate {
                        path,
                        loaded: false,
                    });
                }
            }
        }
        candidates.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Found {} plugin candidate(s)", candidates.len());
        ImageEffectHost {
            candidates,
            effects: HashMap::new(),
            libraries: Vec::new(),
        }
    }

    /// Create a node for the named effect, or `None` if the name resolves
    /// to nothing. The metadata supplies the effect's parameters.
    pub fn create_node(
        &mut self,
        name: &str,
        metadata: &Map<String, Value>,
        inputs: Vec<SharedNode>,
    ) -> Option<SharedNode> {
        match name {
            FILL_EFFECT => {
                let size = metadata_size(metadata, "size").unwrap_or((0, 0));
                let color = metadata_color(metadata, "color").unwrap_or(Color::BLACK);
                Some(shared(FillNode::new(size, color)))
            }
            CHECKERS_EFFECT => {
                let size = metadata_size(metadata, "size").unwrap_or((0, 0));
                let checker_size = metadata_size(metadata, "checker_size").unwrap_or((8, 8));
                let color1 = metadata_color(metadata, "color1").unwrap_or(Color::WHITE);
                let color2 = metadata_color(metadata, "color2").unwrap_or(Color::BLACK);
                Some(shared(CheckersNode::new(size, checker_size, color1, color2)))
            }
            GRADIENT_EFFECT => {
                let size = metadata_size(metadata, "size").unwrap_or((0, 0));
                let color1 = metadata_color(metadata, "color1").unwrap_or(Color::BLACK);
                let color2 = metadata_color(metadata, "color2").unwrap_or(Color::WHITE);
                Some(shared(GradientNode::new(size, color1, color2)))
            }
            DISSOLVE_EFFECT => {
                let (outgoing, incoming) = two_inputs(name, inputs)?;
                let value = metadata_f64(metadata, "value").unwrap_or(0.0);
                Some(shared(DissolveNode::new(value, outgoing, incoming)))
            }
            WIPE_EFFECT => {
                let (outgoing, incoming) = two_inputs(name, inputs)?;
                let value = metadata_f64(metadata, "value").unwrap_or(0.0);
                let dir = match metadata_string(metadata, "dir") {
                    Some(text) => WipeDir::parse(text).unwrap_or_else(|| {
                        warn!("Unknown wipe direction '{}'", text);
                        WipeDir::LeftToRight
                    }),
                    None => WipeDir::LeftToRight,
                };
                let soft_edge = metadata_f64(metadata, "soft_edge").unwrap_or(0.0);
                Some(shared(WipeNode::new(value, dir, soft_edge, outgoing, incoming)))
            }
            _ => {
                let render = self.resolve_plugin(name)?;
                Some(shared(PluginEffectNode::new(
                    name,
                    render,
                    metadata.clone(),
                    inputs,
                )))
            }
        }
    }

    fn resolve_plugin(&mut self, name: &str) -> Option<RenderFn> {
        if !self.effects.contains_key(name) {
            self.load_candidates_until(name);
        }
        self.effects.get(name).map(|effect| effect.render)
    }

    fn load_candidates_until(&mut self, name: &str) {
        for index in 0..self.candidates.len() {
            if self.effects.contains_key(name) {
                return;
            }
            if self.candidates[index].loaded {
                continue;
            }
            self.candidates[index].loaded = true;
            let path = self.candidates[index].path.clone();
            self.load_library(&path);
        }
    }

    /// Load every remaining candidate library, for tools that want the
    /// complete effect list up front.
    pub fn load_all_plugins(&mut self) {
        for index in 0..self.candidates.len() {
            if self.candidates[index].loaded {
                continue;
            }
            self.candidates[index].loaded = true;
            let path = self.candidates[index].path.clone();
            self.load_library(&path);
        }
    }

    fn load_library(&mut self, path: &Path) {
        let library = match ofx::open_library(path) {
            Ok(library) => library,
            Err(error) => {
                warn!("Failed to load plugin library {}: {}", path.display(), error);
                return;
            }
        };
        match ofx::load_effects(&library) {
            Ok(effects) => {
                for effect in effects {
                    debug!(
                        "Registered effect '{}' (version {}) from {}",
                        effect.name,
                        effect.version,
                        path.display()
                    );
                    self.effects.insert(effect.name.clone(), effect);
                }
                self.libraries.push(library);
            }
            Err(error) => {
                warn!("Skipping {}: {}", path.display(), error);
            }
        }
    }

    /// Names of all known effects: built-ins plus everything registered
    /// from plugins so far, sorted.
    pub fn effect_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_EFFECTS.iter().map(|name| name.to_string()).collect();
        names.extend(self.effects.keys().cloned());
        names.sort();
        names
    }

    pub fn candidate_paths(&self) -> Vec<&Path> {
        self.candidates
            .iter()
            .map(|candidate| candidate.path.as_path())
            .collect()
    }
}

/// Plugin directories listed in the `KINOGRAPH_PLUGIN_PATH` environment
/// variable.
pub fn plugin_search_paths() -> Vec<PathBuf> {
    match std::env::var_os(PLUGIN_PATH_ENV) {
        Some(paths) => std::env::split_paths(&paths).collect(),
        None => Vec::new(),
    }
}

fn two_inputs(name: &str, inputs: Vec<SharedNode>) -> Option<(SharedNode, SharedNode)> {
    if inputs.len() != 2 {
        warn!("Effect '{}' requires two inputs, got {}", name, inputs.len());
        return None;
    }
    let mut inputs = inputs.into_iter();
    let outgoing = inputs.next()?;
    let incoming = inputs.next()?;
    Some((outgoing, incoming))
}

pub(crate) fn metadata_size(metadata: &Map<String, Value>, key: &str) -> Option<(u32, u32)> {
    let values = metadata.get(key)?.as_array()?;
    if values.len() != 2 {
        return None;
    }
    Some((values[0].as_u64()? as u32, values[1].as_u64()? as u32))
}

pub(crate) fn metadata_color(metadata: &Map<String, Value>, key: &str) -> Option<Color> {
    let values = metadata.get(key)?.as_array()?;
    if values.len() != 4 {
        return None;
    }
    Some(Color::from_rgba_f64([
        values[0].as_f64()?,
        values[1].as_f64()?,
        values[2].as_f64()?,
        values[3].as_f64()?,
    ]))
}

pub(crate) fn metadata_f64(metadata: &Map<String, Value>, key: &str) -> Option<f64> {
    metadata.get(key)?.as_f64()
}

pub(crate) fn metadata_string<'a>(metadata: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    metadata.get(key)?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::generator::FillNode;
    use crate::model::time::RationalTime;
    use serde_json::json;

    fn metadata(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {:?}", other),
        }
    }

    #[test]
    fn test_create_builtin_fill() {
        let mut host = ImageEffectHost::new(&[]);
        let parameters = metadata(json!({
            "size": [4, 2],
            "color": [1.0, 0.0, 0.0, 1.0]
        }));
        let node = host
            .create_node(FILL_EFFECT, &parameters, Vec::new())
            .expect("fill not created");
        let image = node
            .borrow_mut()
            .exec(RationalTime::default())
            .expect("exec failed");
        assert_eq!(image.width, 4);
        assert_eq!(image.pixel(0, 0), Color::new(255, 0, 0, 255));
    }

    #[test]
    fn test_unknown_effect_resolves_to_none() {
        let mut host = ImageEffectHost::new(&[]);
        let node = host.create_node("acme:Swirl", &Map::new(), Vec::new());
        assert!(node.is_none());
    }

    #[test]
    fn test_dissolve_requires_two_inputs() {
        let mut host = ImageEffectHost::new(&[]);
        let one_input = vec![shared(FillNode::new((1, 1), Color::WHITE))];
        let node = host.create_node(DISSOLVE_EFFECT, &Map::new(), one_input);
        assert!(node.is_none());
    }

    #[test]
    fn test_wipe_parses_direction_metadata() {
        let mut host = ImageEffectHost::new(&[]);
        let parameters = metadata(json!({ "value": 1.0, "dir": "ttb", "soft_edge": 0.0 }));
        let inputs = vec![
            shared(FillNode::new((2, 2), Color::BLACK)),
            shared(FillNode::new((2, 2), Color::WHITE)),
        ];
        let node = host
            .create_node(WIPE_EFFECT, &parameters, inputs)
            .expect("wipe not created");
        assert_eq!(node.borrow().label(), "Wipe");
        let image = node
            .borrow_mut()
            .exec(RationalTime::default())
            .expect("exec failed");
        assert_eq!(image.pixel(0, 0), Color::WHITE);
    }

    #[test]
    fn test_missing_plugin_directory_is_tolerated() {
        let host = ImageEffectHost::new(&[PathBuf::from("/nonexistent/kinograph/plugins")]);
        assert!(host.candidate_paths().is_empty());
    }

    #[test]
    fn test_metadata_helpers_reject_malformed_values() {
        let values = metadata(json!({
            "size": [16],
            "color": [1.0, 0.0, 0.0],
            "name": 7
        }));
        assert_eq!(metadata_size(&values, "size"), None);
        assert_eq!(metadata_color(&values, "color"), None);
        assert_eq!(metadata_string(&values, "name"), None);
        assert_eq!(metadata_f64(&values, "missing"), None);
    }
}
