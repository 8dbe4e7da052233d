use std::f64::consts::TAU;

use rand::Rng;

use crate::assets::{Category, SceneAssets};
use crate::color::Rgb;
use crate::geometry::{sized_structure, Appearance, Viewport};

pub const BACK_FALLBACK: Rgb = Rgb::hex(0x080808);
pub const FRONT_FALLBACK: Rgb = Rgb::hex(0x0a0a0e);

/// Population densities, which differ between desktop and mobile widths
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density {
    /// One background pyramid per this many pixels of width
    pub back_divisor: u32,
    pub back_min_width: f64,
    pub cities: usize,
    pub pyramids_per_city: usize,
    pub base_size: f64,
    pub glyphs: usize,
}

impl Density {
    pub fn for_viewport(viewport: Viewport) -> Self {
        if viewport.is_mobile() {
            Density {
                back_divisor: 20,
                back_min_width: 30.0,
                cities: 1,
                pyramids_per_city: 3,
                base_size: 92.0,
                glyphs: 8,
            }
        } else {
            Density {
                back_divisor: 5,
                back_min_width: 15.0,
                cities: 3,
                pyramids_per_city: 6,
                base_size: 40.0,
                glyphs: 30,
            }
        }
    }
}

/// Pyramid standing on `base_y`, centered on `x`
#[derive(Clone, Debug, PartialEq)]
pub struct Pyramid {
    pub x: f64,
    pub base_y: f64,
    pub width: f64,
    pub height: f64,
    pub alpha: f64,
    pub appearance: Appearance,
}

/// Small blinking mark that drifts upward
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub speed_y: f64,
    pub opacity: f64,
    pub blink_speed: f64,
    /// Offset into the blink cycle
    pub phase: f64,
}

impl Glyph {
    /// Rises and wraps from 0.4 h back down to 0.9 h
    pub fn advance(&mut self, viewport: Viewport) {
        self.y -= self.speed_y;
        if self.y < viewport.h() * 0.4 {
            self.y = viewport.h() * 0.9;
        }
    }

    pub fn blink(&self, time: f64) -> f64 {
        0.5 + (time * self.blink_speed + self.phase).sin() * 0.5
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ceremonial {
    /// Dense darkened silhouettes, composited once
    pub background: Vec<Pyramid>,
    /// Larger lit pyramids grouped into cities, composited once
    pub cities: Vec<Pyramid>,
    pub glyphs: Vec<Glyph>,
}

pub fn generate<R: Rng>(viewport: Viewport, assets: &SceneAssets, rng: &mut R) -> Ceremonial {
    let (w, h) = (viewport.w(), viewport.h());
    let horizon = h * 0.82;
    let density = Density::for_viewport(viewport);
    let sprites = assets.get(Category::Pyramids);

    let background = (0..viewport.width / density.back_divisor)
        .map(|_| {
            let width = density.back_min_width + rng.random::<f64>() * 25.0;
            let x = rng.random::<f64>() * w;
            let alpha = 0.5 + rng.random::<f64>() * 0.3;
            let (height, appearance) = sized_structure(width, sprites, 1.5, BACK_FALLBACK, rng);
            Pyramid {
                x,
                base_y: horizon + 5.0,
                width,
                height,
                alpha,
                appearance,
            }
        })
        .collect();

    let segment = w / density.cities as f64;
    let spread = segment * 0.7;
    let mut cities = Vec::with_capacity(density.cities * density.pyramids_per_city);
    for c in 0..density.cities {
        let center = c as f64 * segment + segment / 2.0;
        for _ in 0..density.pyramids_per_city {
            let mut width = density.base_size + rng.random::<f64>() * 10.0;
            if rng.random::<f64>() > 0.7 {
                width *= 1.15;
            }
            let x = center + (rng.random::<f64>() - 0.5) * spread;
            let (height, appearance) = sized_structure(width, sprites, 1.2, FRONT_FALLBACK, rng);
            cities.push(Pyramid {
                x,
                base_y: horizon + 5.0,
                width,
                height,
                alpha: 1.0,
                appearance,
            });
        }
    }

    let glyphs = (0..density.glyphs)
        .map(|_| Glyph {
            x: rng.random::<f64>() * w,
            y: h * 0.6 + rng.random::<f64>() * h * 0.3,
            size: 1.0 + rng.random::<f64>() * 2.0,
            speed_y: 0.1 + rng.random::<f64>() * 0.3,
            opacity: rng.random::<f64>() * 0.5,
            blink_speed: 0.01 + rng.random::<f64>() * 0.04,
            phase: rng.random::<f64>() * TAU,
        })
        .collect();

    Ceremonial {
        background,
        cities,
        glyphs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene(w: u32) -> Ceremonial {
        let mut rng = StdRng::seed_from_u64(5);
        generate(Viewport::new(w, 800), &SceneAssets::default(), &mut rng)
    }

    #[test]
    fn test_desktop_density() {
        let s = scene(1200);
        assert_eq!(s.background.len(), 240);
        assert_eq!(s.cities.len(), 18);
        assert_eq!(s.glyphs.len(), 30);
    }

    #[test]
    fn test_mobile_density() {
        let s = scene(600);
        assert_eq!(s.background.len(), 30);
        assert_eq!(s.cities.len(), 3);
        assert_eq!(s.glyphs.len(), 8);
        assert!(s.cities.iter().all(|p| p.width >= 92.0));
    }

    #[test]
    fn test_fallback_shapes() {
        let s = scene(1000);
        for p in &s.background {
            assert_eq!(p.appearance, Appearance::Block(BACK_FALLBACK));
            assert!((p.height - p.width * 1.5).abs() < 1e-9);
            assert!((0.5..=0.8).contains(&p.alpha));
        }
        for p in &s.cities {
            assert_eq!(p.appearance, Appearance::Block(FRONT_FALLBACK));
            assert!((p.height - p.width * 1.2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cities_cluster_in_segments() {
        let s = scene(1500);
        for (i, p) in s.cities.iter().enumerate() {
            let city = i / 6;
            let center = city as f64 * 500.0 + 250.0;
            assert!((p.x - center).abs() <= 175.0);
        }
    }

    #[test]
    fn test_glyph_wraps() {
        let vp = Viewport::new(1000, 1000);
        let mut g = Glyph {
            x: 10.0,
            y: 400.1,
            size: 2.0,
            speed_y: 0.3,
            opacity: 0.4,
            blink_speed: 0.02,
            phase: 1.0,
        };
        g.advance(vp);
        assert!((g.y - 900.0).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&g.blink(123.0)));
        assert!((g.blink(0.0) - (0.5 + 1.0f64.sin() * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_glyphs_blink_out_of_step() {
        let s = scene(1200);
        assert!(s.glyphs.iter().all(|g| (0.0..TAU).contains(&g.phase)));
        let first = s.glyphs[0].blink(0.0);
        let distinct = s.glyphs.iter().filter(|g| (g.blink(0.0) - first).abs() > 1e-6).count();
        assert!(distinct >= s.glyphs.len() / 2, "{distinct} of {} glyphs differ", s.glyphs.len());
    }
}
