use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use crate::assets::paths::AssetRoots;
use crate::foundation::error::{KioskError, KioskResult};
use crate::media::backend::{MediaBackend, MediaEventKind, PlayerId};
use crate::media::sounds::SoundBank;
use crate::scene::model::{DocFormat, PreloadSpec, SceneSpec};
use crate::scene::scene::{Scene, SceneTuning};
use crate::session::requests::TransitionRequests;

/// Where scene definitions come from.
pub trait SceneSource {
    /// Parse and validate the definition of `name`.
    fn load_spec(&self, name: &str) -> KioskResult<SceneSpec>;
    /// Parse the preload document; `Ok(None)` when there is none.
    fn load_preload(&self, name: &str) -> KioskResult<Option<PreloadSpec>>;
    /// Every scene definition the source can provide, sorted.
    fn scene_names(&self) -> KioskResult<Vec<String>>;
}

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// One document per scene in a directory: `<name>.yaml`, `<name>.yml` or `<name>.json`.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
    preload_name: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            preload_name: "preload".to_string(),
        }
    }

    /// Document name excluded from [`SceneSource::scene_names`].
    pub fn with_preload_name(mut self, name: impl Into<String>) -> Self {
        self.preload_name = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return None;
        }
        EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl SceneSource for DirectorySource {
    fn load_spec(&self, name: &str) -> KioskResult<SceneSpec> {
        let path = self.find(name).ok_or_else(|| {
            KioskError::scene_load(format!(
                "scene '{name}' not found in '{}'",
                self.root.display()
            ))
        })?;
        SceneSpec::from_path(&path).map_err(|e| match e {
            KioskError::SceneLoad(_) => e,
            other => KioskError::scene_load(format!("scene '{name}': {other}")),
        })
    }

    fn load_preload(&self, name: &str) -> KioskResult<Option<PreloadSpec>> {
        let Some(path) = self.find(name) else {
            return Ok(None);
        };
        let format = DocFormat::from_path(&path)
            .ok_or_else(|| KioskError::validation("unsupported preload document"))?;
        let text = std::fs::read_to_string(&path)
            .map_err(|e| KioskError::scene_load(format!("read '{}': {e}", path.display())))?;
        let spec: PreloadSpec = format.parse(&text)?;
        Ok(Some(spec))
    }

    fn scene_names(&self) -> KioskResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            KioskError::scene_load(format!("read dir '{}': {e}", self.root.display()))
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| KioskError::scene_load(e.to_string()))?
                .path();
            if DocFormat::from_path(&path).is_none() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem != self.preload_name {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Scene definitions held in memory; used by tests and embedders that build specs in code.
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    scenes: BTreeMap<String, SceneSpec>,
    preload: Option<PreloadSpec>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, name: impl Into<String>, spec: SceneSpec) -> Self {
        self.scenes.insert(name.into(), spec);
        self
    }

    pub fn with_preload(mut self, preload: PreloadSpec) -> Self {
        self.preload = Some(preload);
        self
    }
}

impl SceneSource for InMemorySource {
    fn load_spec(&self, name: &str) -> KioskResult<SceneSpec> {
        let spec = self
            .scenes
            .get(name)
            .cloned()
            .ok_or_else(|| KioskError::scene_load(format!("scene '{name}' not defined")))?;
        spec.validate()?;
        Ok(spec)
    }

    fn load_preload(&self, _name: &str) -> KioskResult<Option<PreloadSpec>> {
        Ok(self.preload.clone())
    }

    fn scene_names(&self) -> KioskResult<Vec<String>> {
        Ok(self.scenes.keys().cloned().collect())
    }
}

/// Lazily built, never evicted cache of [`Scene`] instances keyed by name.
///
/// A scene is parsed and instantiated on first reference; later references return the same
/// instance, whose media handles stay open for the life of the process.
pub struct SceneStore {
    source: Box<dyn SceneSource>,
    scenes: BTreeMap<String, Scene>,
    requests: TransitionRequests,
    tuning: SceneTuning,
}

impl std::fmt::Debug for SceneStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneStore")
            .field("loaded", &self.scenes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SceneStore {
    pub fn new(
        source: Box<dyn SceneSource>,
        requests: TransitionRequests,
        tuning: SceneTuning,
    ) -> Self {
        Self {
            source,
            scenes: BTreeMap::new(),
            requests,
            tuning,
        }
    }

    pub fn source(&self) -> &dyn SceneSource {
        self.source.as_ref()
    }

    /// Return the cached scene or build it from its definition.
    ///
    /// Menu sounds the scene names are made available in `sounds`.
    pub fn load(
        &mut self,
        name: &str,
        backend: &mut dyn MediaBackend,
        roots: &AssetRoots,
        sounds: &mut SoundBank,
    ) -> KioskResult<&mut Scene> {
        match self.scenes.entry(name.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let spec = self.source.load_spec(name)?;
                for problem in spec.asset_problems() {
                    tracing::warn!(scene = %name, %problem, "degraded asset");
                }
                for file in [&spec.move_sound, &spec.select_sound].into_iter().flatten() {
                    sounds.ensure(file, backend, roots);
                }
                tracing::info!(scene = %name, "scene loaded");
                let scene = Scene::new(
                    name,
                    spec,
                    backend,
                    roots,
                    self.requests.clone(),
                    self.tuning,
                );
                Ok(e.insert(scene))
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    /// Name of the scene owning `player`.
    pub fn locate(&self, player: PlayerId) -> Option<&str> {
        self.scenes
            .iter()
            .find(|(_, s)| s.owns_player(player))
            .map(|(name, _)| name.as_str())
    }

    /// Route a backend notification to the scene owning `player`; returns that scene's name.
    pub fn dispatch(&mut self, player: PlayerId, kind: &MediaEventKind) -> Option<String> {
        self.scenes
            .iter_mut()
            .find_map(|(name, s)| s.handle_media_event(player, kind).then(|| name.clone()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/store.rs"]
mod tests;
