use std::f64::consts::PI;

use rand::Rng;

use crate::assets::{Category, SceneAssets, Sprite};
use crate::geometry::Viewport;
use crate::math::position_hash;

/// Population sizes for the three building layers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerCounts {
    pub back: usize,
    pub mid: usize,
    pub front: usize,
}

/// Desktop maxima
pub const MAX_COUNTS: LayerCounts = LayerCounts {
    back: 40,
    mid: 25,
    front: 12,
};

/// Vertical spacing of window rows on front buildings
pub const FLOOR_HEIGHT: f64 = 7.0;

impl LayerCounts {
    pub fn for_viewport(viewport: Viewport) -> Self {
        if viewport.is_mobile() {
            LayerCounts {
                back: MAX_COUNTS.back / 2,
                mid: MAX_COUNTS.mid / 2,
                front: MAX_COUNTS.front / 2,
            }
        } else {
            MAX_COUNTS
        }
    }

    pub fn total(&self) -> usize {
        self.back + self.mid + self.front
    }
}

/// Window brightness above which a window counts as lit
pub const WINDOW_LIT_LEVEL: f64 = 0.7;

/// One row of windows
#[derive(Clone, Debug, PartialEq)]
pub struct Floor {
    pub y_offset: f64,
    /// Shifts the whole row's blink cycle
    pub phase: f64,
}

impl Floor {
    /// Slow on/off cycle in [0, 1] for the window starting at `wx`. The
    /// position hash keeps neighbouring windows out of step.
    pub fn window_level(&self, wx: f64, time: f64) -> f64 {
        let seed = position_hash(wx, self.y_offset);
        ((time * 0.0015 + seed + self.phase).sin() + 1.0) / 2.0
    }

    pub fn window_lit(&self, wx: f64, time: f64) -> bool {
        self.window_level(wx, time) > WINDOW_LIT_LEVEL
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Building {
    /// Center as a fraction of the viewport width
    pub x_rel: f64,
    pub y_base: f64,
    pub width: f64,
    pub height: f64,
    pub antenna: bool,
    /// Only front buildings have floors
    pub floors: Vec<Floor>,
}

/// Landmark sprite near the right edge; `sprite` is `None` until one loads
#[derive(Clone, Debug, PartialEq)]
pub struct Monument {
    pub x: f64,
    pub base_y: f64,
    pub width: f64,
    pub height: f64,
    pub sprite: Option<Sprite>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Skyline {
    pub back: Vec<Building>,
    pub mid: Vec<Building>,
    pub front: Vec<Building>,
    pub monument: Monument,
}

fn size_factor(viewport: Viewport) -> f64 {
    if viewport.is_mobile() {
        0.5
    } else {
        1.0
    }
}

fn plain<R: Rng>(rng: &mut R, width: (f64, f64), height: (f64, f64), k: f64) -> Building {
    Building {
        x_rel: rng.random(),
        y_base: 0.0,
        width: (width.0 + rng.random::<f64>() * width.1) * k,
        height: (height.0 + rng.random::<f64>() * height.1) * k,
        antenna: false,
        floors: Vec::new(),
    }
}

/// Front buildings avoid the monument's slot near the right edge
fn front_position<R: Rng>(rng: &mut R) -> f64 {
    let mut x = rng.random::<f64>() * 0.6;
    if rng.random::<f64>() > 0.5 {
        x += 0.4;
    }
    if x > 0.82 && x < 0.98 {
        x -= 0.15;
    }
    x
}

fn front<R: Rng>(rng: &mut R, k: f64) -> Building {
    let x_rel = front_position(rng);
    let y_base = rng.random::<f64>() * 0.05;
    let width = (15.0 + rng.random::<f64>() * 20.0) * k;
    let height = (30.0 + rng.random::<f64>() * 60.0) * k;
    let antenna = rng.random::<f64>() > 0.7;
    let floors = (0..(height / FLOOR_HEIGHT).floor() as usize)
        .map(|f| Floor {
            y_offset: f as f64 * FLOOR_HEIGHT + 5.0,
            phase: rng.random::<f64>() * PI,
        })
        .collect();
    Building {
        x_rel,
        y_base,
        width,
        height,
        antenna,
        floors,
    }
}

/// Monument placement: 0.9 w, a tenth of the viewport tall, source aspect kept
pub fn monument(viewport: Viewport, horizon: f64, sprite: Option<&Sprite>) -> Monument {
    let height = viewport.h() * 0.10;
    let width = match sprite {
        Some(s) => height * s.width() as f64 / s.height().max(1) as f64,
        None => height * 0.5,
    };
    Monument {
        x: viewport.w() * 0.9,
        base_y: horizon,
        width,
        height,
        sprite: sprite.cloned(),
    }
}

pub fn generate<R: Rng>(viewport: Viewport, assets: &SceneAssets, rng: &mut R) -> Skyline {
    let counts = LayerCounts::for_viewport(viewport);
    let k = size_factor(viewport);
    let back = (0..counts.back)
        .map(|_| plain(rng, (4.0, 6.0), (8.0, 20.0), k))
        .collect();
    let mid = (0..counts.mid)
        .map(|_| plain(rng, (5.0, 10.0), (15.0, 30.0), k))
        .collect();
    let front = (0..counts.front).map(|_| front(rng, k)).collect();
    let horizon = viewport.h() * 0.82;
    Skyline {
        back,
        mid,
        front,
        monument: monument(viewport, horizon, assets.first(Category::Monument)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn skyline(w: u32, seed: u64) -> Skyline {
        let mut rng = StdRng::seed_from_u64(seed);
        generate(Viewport::new(w, 800), &SceneAssets::default(), &mut rng)
    }

    #[test]
    fn test_counts_halve_on_mobile() {
        let desktop = skyline(1280, 7);
        let mobile = skyline(600, 7);
        assert_eq!(
            (desktop.back.len(), desktop.mid.len(), desktop.front.len()),
            (40, 25, 12)
        );
        assert_eq!((mobile.back.len(), mobile.mid.len(), mobile.front.len()), (20, 12, 6));
        for (d, m) in [(40, 20), (25, 12), (12, 6)] {
            assert!(m * 2 == d || m * 2 + 1 == d);
        }
    }

    #[test]
    fn test_counts_never_exceed_maxima() {
        for w in [100, 767, 768, 1024, 3840] {
            let counts = LayerCounts::for_viewport(Viewport::new(w, 500));
            assert!(counts.back <= MAX_COUNTS.back);
            assert!(counts.mid <= MAX_COUNTS.mid);
            assert!(counts.front <= MAX_COUNTS.front);
        }
    }

    #[test]
    fn test_front_buildings_have_floors() {
        let s = skyline(1440, 11);
        for b in &s.front {
            assert!(b.width >= 15.0 && b.width <= 35.0);
            assert!(b.height >= 30.0 && b.height <= 90.0);
            assert_eq!(b.floors.len(), (b.height / FLOOR_HEIGHT).floor() as usize);
            if let Some(first) = b.floors.first() {
                assert_eq!(first.y_offset, 5.0);
            }
        }
        assert!(s.back.iter().chain(&s.mid).all(|b| b.floors.is_empty()));
    }

    #[test]
    fn test_floor_phase_shifts_window_cycle() {
        let a = Floor { y_offset: 17.0, phase: 0.0 };
        let b = Floor { y_offset: 17.0, phase: PI };
        for (wx, time) in [(4.0, 0.0), (12.0, 300.0), (52.5, 4000.0)] {
            let (la, lb) = (a.window_level(wx, time), b.window_level(wx, time));
            assert!((la + lb - 1.0).abs() < 1e-9);
            assert!(!(a.window_lit(wx, time) && b.window_lit(wx, time)));
        }
        let s = skyline(1440, 11);
        let phases: Vec<f64> = s.front.iter().flat_map(|b| &b.floors).map(|f| f.phase).collect();
        assert!(phases.iter().all(|p| (0.0..PI).contains(p)));
        assert!(phases.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_mobile_sizes_halved() {
        let s = skyline(500, 5);
        assert!(s.front.iter().all(|b| b.width <= 17.5 && b.height <= 45.0));
    }

    #[test]
    fn test_monument_without_sprite() {
        let s = skyline(1000, 1);
        assert!(s.monument.sprite.is_none());
        assert!((s.monument.x - 900.0).abs() < 1e-9);
        assert!((s.monument.height - 80.0).abs() < 1e-9);
    }
}
