//! Headless rendering straight to a PNG file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::RgbaImage;
use tracing::info;

use crate::assets::AssetStore;
use crate::config::Cli;
use crate::display::{DisplayError, FrameSink};
use crate::graphics::Canvas;
use crate::scheduler::ScenePipeline;
use crate::scroll::{ScrollMetrics, ScrollSource};

/// Writes every presented frame to `path`, replacing the previous one
pub struct PngSink {
    path: PathBuf,
}

impl PngSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PngSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for PngSink {
    fn present(&mut self, canvas: &Canvas) -> Result<(), DisplayError> {
        let (width, height) = (canvas.width(), canvas.height());
        let image = RgbaImage::from_raw(width as u32, height as u32, canvas.pixels().to_vec())
            .filter(|_| width > 0 && height > 0)
            .ok_or(DisplayError::EmptyFrame { width, height })?;
        image.save(&self.path).map_err(|source| DisplayError::Image {
            path: self.path.clone(),
            source,
        })
    }
}

/// Scroll metrics parked at a fixed progress
fn fixed_scroll(viewport_height: f64, progress: f64) -> ScrollMetrics {
    let mut metrics = ScrollMetrics::for_viewport(viewport_height);
    metrics.scroll_by(progress * (metrics.content_height - metrics.viewport_height));
    metrics
}

/// Renders `--frames` frames of the configured page and writes the last one.
/// Unlike the interactive app this waits for the images first.
pub fn run_snapshot(cli: &Cli, path: &Path) -> anyhow::Result<()> {
    let viewport = cli.snapshot_viewport();
    let assets = AssetStore::new().load_all(cli.manifest(), |_| {}).wait();

    let code = &cli.constellation_code;
    let mut pipeline = ScenePipeline::new(cli.page, viewport, &assets, cli.seed, code);
    let mut scroll = fixed_scroll(viewport.h(), cli.scroll_progress());
    let mut canvas = Canvas::new(viewport.width as usize, viewport.height as usize);
    for _ in 0..cli.frames {
        pipeline.render_frame(&mut canvas, &mut scroll);
    }

    PngSink::new(path)
        .present(&canvas)
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    info!(
        path = %path.display(),
        page = %cli.page,
        %viewport,
        frames = cli.frames,
        "snapshot written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_scroll_reports_progress() {
        let mut scroll = fixed_scroll(720.0, 0.25);
        let first = ScrollSource::progress(&mut scroll);
        assert!((first - 0.25).abs() < 1e-12);
        assert_eq!(ScrollSource::progress(&mut scroll), first);
    }

    #[test]
    fn test_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut canvas = Canvas::new(3, 2);
        canvas.fill_rect(0.0, 0.0, 3.0, 2.0, crate::color::Rgb::new(1, 2, 3));
        PngSink::new(&path).present(&canvas).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_empty_canvas_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = PngSink::new(dir.path().join("x.png")).present(&Canvas::new(0, 0)).unwrap_err();
        assert!(matches!(err, DisplayError::EmptyFrame { .. }));
    }
}
