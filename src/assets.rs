use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use image::RgbaImage;
use parking_lot::RwLock;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Semantic image group the scene generators ask for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Pyramids,
    Huts,
    Monument,
}

impl Category {
    pub fn name(self) -> &'static str {
        match self {
            Category::Pyramids => "pyramids",
            Category::Huts => "huts",
            Category::Monument => "monument",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded image, cheap to clone
#[derive(Clone)]
pub struct Sprite {
    image: Arc<RgbaImage>,
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sprite({}x{})", self.width(), self.height())
    }
}

impl PartialEq for Sprite {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

impl Sprite {
    pub fn new(image: RgbaImage) -> Self {
        Sprite { image: Arc::new(image) }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Height over width
    pub fn ratio(&self) -> f64 {
        self.height() as f64 / self.width().max(1) as f64
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width() || y >= self.height() {
            return [0; 4];
        }
        self.image.get_pixel(x, y).0
    }
}

/// Reads and decodes a single image file
pub fn load_sprite(path: &Path) -> Result<Sprite, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Sprite::new(image.to_rgba8()))
}

/// Category -> file list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetManifest {
    entries: Vec<(Category, PathBuf)>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard scene images, resolved against `dir`
    pub fn standard(dir: &Path) -> Self {
        AssetManifest::new()
            .with(Category::Pyramids, dir.join("maya-pyramid.png"))
            .with(Category::Pyramids, dir.join("maya-pyramid2.png"))
            .with(Category::Huts, dir.join("mayan_house.png"))
            .with(Category::Huts, dir.join("mayan_house2.png"))
            .with(Category::Monument, dir.join("salvador_del_mundo.png"))
    }

    pub fn with(mut self, category: Category, path: impl Into<PathBuf>) -> Self {
        self.entries.push((category, path.into()));
        self
    }

    pub fn entries(&self) -> &[(Category, PathBuf)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whatever images loaded, by category. A missing or empty category means
/// "use the flat fallback shape".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneAssets {
    images: BTreeMap<Category, Vec<Sprite>>,
}

impl SceneAssets {
    pub fn get(&self, category: Category) -> &[Sprite] {
        self.images.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, category: Category) -> Option<&Sprite> {
        self.get(category).first()
    }

    pub fn insert(&mut self, category: Category, sprite: Sprite) {
        self.images.entry(category).or_default().push(sprite);
    }

    /// Total number of loaded images
    pub fn count(&self) -> usize {
        self.images.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Best-effort background image loader
#[derive(Clone, Default)]
pub struct AssetStore {
    assets: Arc<RwLock<SceneAssets>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current best-effort view; empty until something has loaded
    pub fn snapshot(&self) -> SceneAssets {
        self.assets.read().clone()
    }

    /// Starts loading every manifest entry concurrently on a background thread.
    ///
    /// Individual failures are logged and skipped. `on_settled` runs exactly once
    /// after every attempt finished, with the final snapshot.
    pub fn load_all<F>(&self, manifest: AssetManifest, on_settled: F) -> AssetLoad
    where
        F: FnOnce(&SceneAssets) + Send + 'static,
    {
        let assets = Arc::clone(&self.assets);
        let handle = thread::spawn(move || {
            let results: Vec<(Category, Result<Sprite, AssetError>)> = manifest
                .entries()
                .par_iter()
                .map(|(category, path)| {
                    let result = load_sprite(path);
                    if let Ok(sprite) = &result {
                        assets.write().insert(*category, sprite.clone());
                    }
                    (*category, result)
                })
                .collect();

            // Rebuild in manifest order so the settled snapshot does not depend
            // on which loads finished first
            let mut settled = SceneAssets::default();
            for (category, result) in results {
                match result {
                    Ok(sprite) => settled.insert(category, sprite),
                    Err(e) => warn!(%category, "asset unavailable: {e}"),
                }
            }
            *assets.write() = settled.clone();
            info!(
                loaded = settled.count(),
                requested = manifest.len(),
                "asset loading settled"
            );
            on_settled(&settled);
            settled
        });

        AssetLoad {
            handle,
            assets: Arc::clone(&self.assets),
        }
    }
}

/// Handle to an in-flight [`AssetStore::load_all`]
pub struct AssetLoad {
    handle: JoinHandle<SceneAssets>,
    assets: Arc<RwLock<SceneAssets>>,
}

impl AssetLoad {
    /// Blocks until every load attempt settled and returns the final snapshot
    pub fn wait(self) -> SceneAssets {
        match self.handle.join() {
            Ok(settled) => settled,
            Err(_) => {
                warn!("asset loader thread panicked, using partial snapshot");
                self.assets.read().clone()
            }
        }
    }
}
