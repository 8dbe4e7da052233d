use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::assets::AssetManifest;
use crate::geometry::{SceneKind, Viewport};

/// Largest snapshot side in pixels
pub const MAX_DIMENSION: u32 = 8192;
/// Largest number of canvas pixels per terminal column
pub const MAX_SCALE: u32 = 16;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("--{0} must be greater than zero")]
    Zero(&'static str),

    #[error("--{name} must be at most {max}, got {value}")]
    TooLarge {
        name: &'static str,
        value: u32,
        max: u32,
    },

    #[error("--scroll must be a finite number, got {0}")]
    Scroll(f64),

    #[error("--constellation-code must not be empty")]
    EmptyCode,
}

/// Procedural parallax landscapes with a rotating menu artifact
#[derive(Parser, Debug, Clone)]
#[command(name = "skyscape", version, about)]
pub struct Cli {
    /// Page kind to render
    #[arg(long, value_enum, default_value_t = SceneKind::Urban)]
    pub page: SceneKind,

    /// Directory holding the pyramid, hut and monument images
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Seed for reproducible layouts
    #[arg(long)]
    pub seed: Option<u64>,

    /// Canvas pixels per terminal column
    #[arg(long, default_value_t = 6)]
    pub scale: u32,

    /// Display refresh rate the render loop syncs to
    #[arg(long, default_value_t = 60)]
    pub refresh_hz: u32,

    /// Ease the wheel-driven scroll instead of moving the page directly
    #[arg(long)]
    pub eased_scroll: bool,

    /// Render headless and write the last frame to this PNG
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Frames to render before writing the snapshot
    #[arg(long, default_value_t = 1)]
    pub frames: u32,

    /// Snapshot width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Snapshot height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Snapshot scroll progress, clamped to [0, 1]
    #[arg(long, default_value_t = 0.0)]
    pub scroll: f64,

    /// Write logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Key sequence that aligns the stars
    #[arg(long, default_value = "lau")]
    pub constellation_code: String,
}

impl Cli {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("width", self.width),
            ("height", self.height),
            ("scale", self.scale),
            ("refresh-hz", self.refresh_hz),
            ("frames", self.frames),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }
        for (name, value, max) in [
            ("width", self.width, MAX_DIMENSION),
            ("height", self.height, MAX_DIMENSION),
            ("scale", self.scale, MAX_SCALE),
        ] {
            if value > max {
                return Err(ConfigError::TooLarge { name, value, max });
            }
        }
        if !self.scroll.is_finite() {
            return Err(ConfigError::Scroll(self.scroll));
        }
        if self.constellation_code.trim().is_empty() {
            return Err(ConfigError::EmptyCode);
        }
        Ok(())
    }

    pub fn manifest(&self) -> AssetManifest {
        match &self.assets {
            Some(dir) => AssetManifest::standard(dir),
            None => AssetManifest::new(),
        }
    }

    pub fn snapshot_viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    pub fn scroll_progress(&self) -> f64 {
        self.scroll.clamp(0.0, 1.0)
    }
}
