use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::artifact::ArtifactController;
use crate::assets::SceneAssets;
use crate::geometry::{SceneKind, Viewport};
use crate::graphics::Canvas;
use crate::landscape::LandscapeRenderer;
use crate::scroll::ScrollSource;
use crate::sky::SkyRenderer;

const SKY_SALT: u64 = 0x5b1;
const LANDSCAPE_SALT: u64 = 0x1a4d;

/// Generator for one component: derived from `seed` when given, OS entropy otherwise
pub fn component_rng(seed: Option<u64>, salt: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(salt)),
        None => StdRng::from_os_rng(),
    }
}

/// Handle to a running render loop. The loop keeps going while the handle is active.
#[derive(Clone, Debug)]
pub struct LoopHandle {
    id: u64,
    active: Arc<AtomicBool>,
}

impl LoopHandle {
    fn new(id: u64) -> Self {
        LoopHandle {
            id,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Issues render-loop handles. At most one issued handle is active at a time.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    issued: u64,
    current: Option<LoopHandle>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the previously issued loop, if any, and issues a fresh handle
    pub fn start(&mut self) -> LoopHandle {
        if let Some(previous) = self.current.take() {
            previous.cancel();
            debug!(id = previous.id, "cancelled previous render loop");
        }
        self.issued += 1;
        let handle = LoopHandle::new(self.issued);
        info!(id = handle.id, "render loop started");
        self.current = Some(handle.clone());
        handle
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }

    pub fn current(&self) -> Option<&LoopHandle> {
        self.current.as_ref()
    }
}

/// Display refresh clock. Frames are presented on refresh boundaries; the
/// time until the next boundary is spent servicing input.
#[derive(Clone, Copy, Debug)]
pub struct VsyncClock {
    period: Duration,
    next: Instant,
}

impl VsyncClock {
    pub fn new(refresh_hz: u32, now: Instant) -> Self {
        let period = Duration::from_secs(1) / refresh_hz.max(1);
        VsyncClock {
            period,
            next: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left until the next refresh boundary
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Moves to the following boundary. A frame that ran long re-aligns the
    /// clock to `now` instead of queueing catch-up frames.
    pub fn tick(&mut self, now: Instant) {
        self.next += self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
    }
}

/// One page's renderers, driven in a fixed order every frame
pub struct ScenePipeline {
    kind: SceneKind,
    viewport: Viewport,
    sky: SkyRenderer,
    landscape: LandscapeRenderer,
    artifact: ArtifactController,
    frame: u64,
}

impl ScenePipeline {
    pub fn new(
        kind: SceneKind,
        viewport: Viewport,
        assets: &SceneAssets,
        seed: Option<u64>,
        constellation_code: &str,
    ) -> Self {
        ScenePipeline {
            kind,
            viewport,
            sky: SkyRenderer::new(viewport, component_rng(seed, SKY_SALT), constellation_code),
            landscape: LandscapeRenderer::new(
                kind,
                viewport,
                assets,
                component_rng(seed, LANDSCAPE_SALT),
            ),
            artifact: ArtifactController::new(viewport),
            frame: 0,
        }
    }

    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Frames rendered so far; the clock of every animation
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn sky(&self) -> &SkyRenderer {
        &self.sky
    }

    pub fn sky_mut(&mut self) -> &mut SkyRenderer {
        &mut self.sky
    }

    pub fn landscape(&self) -> &LandscapeRenderer {
        &self.landscape
    }

    pub fn artifact(&self) -> &ArtifactController {
        &self.artifact
    }

    pub fn artifact_mut(&mut self) -> &mut ArtifactController {
        &mut self.artifact
    }

    pub fn resize(&mut self, viewport: Viewport, assets: &SceneAssets) {
        info!(%viewport, "viewport resized");
        self.viewport = viewport;
        self.sky.resize(viewport);
        self.landscape.resize(viewport, assets);
        self.artifact.resize(viewport);
    }

    pub fn regenerate(&mut self, assets: &SceneAssets) {
        self.landscape.regenerate(assets);
    }

    /// Renders one frame into `canvas` and returns the scroll progress it used
    pub fn render_frame(&mut self, canvas: &mut Canvas, scroll: &mut dyn ScrollSource) -> f64 {
        let progress = scroll.progress();
        self.frame += 1;
        let time = self.frame as f64;

        canvas.clear();
        self.sky.render(canvas, time, progress);
        let light = self.artifact.menu_light();
        self.landscape.render(canvas, time, progress, light);
        self.artifact.render(canvas, progress);
        progress
    }
}
