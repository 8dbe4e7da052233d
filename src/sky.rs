use std::collections::VecDeque;
use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::info;

use crate::color::{Rgb, Rgba};
use crate::geometry::Viewport;
use crate::graphics::{Canvas, Composite, Gradient, Paint, Rect, Shape, Stroke};
use crate::math::{clamp01, Point};

pub const NIGHT: [Rgb; 4] = [
    Rgb::hex(0x020005),
    Rgb::hex(0x2e0a0a),
    Rgb::hex(0x7a1515),
    Rgb::hex(0xff6600),
];
pub const DAY: [Rgb; 4] = [
    Rgb::hex(0x004e92),
    Rgb::hex(0x603f83),
    Rgb::hex(0xfd5e53),
    Rgb::hex(0xffe066),
];
/// Gradient positions of the four sky colors, top to bottom
pub const STOP_OFFSETS: [f64; 4] = [0.0, 0.5, 0.75, 1.0];

pub const STAR_COUNT: usize = 60;
pub const CLOUD_COUNT: usize = 8;

/// Normalized star targets spelling three letters: L (0..=4), A (5..=11), U (12..=17)
pub const CONSTELLATION: [(f64, f64); 18] = [
    (0.35, 0.12),
    (0.35, 0.17),
    (0.35, 0.22),
    (0.38, 0.22),
    (0.41, 0.22),
    (0.46, 0.22),
    (0.48, 0.17),
    (0.50, 0.12),
    (0.52, 0.17),
    (0.54, 0.22),
    (0.48, 0.19),
    (0.52, 0.19),
    (0.59, 0.12),
    (0.59, 0.19),
    (0.61, 0.22),
    (0.63, 0.22),
    (0.65, 0.19),
    (0.65, 0.12),
];
const LETTERS: [(usize, usize); 3] = [(0, 4), (5, 11), (12, 17)];

const SUN: Rgb = Rgb::hex(0xffcc00);

/// Sky colors for a scroll progress: each stop blended between night and day
pub fn sky_stops(scroll: f64) -> [Rgb; 4] {
    let s = clamp01(scroll);
    std::array::from_fn(|i| NIGHT[i].lerp(DAY[i], s))
}

/// Star visibility multiplier; zero in full daylight
pub fn day_fade(scroll: f64) -> f64 {
    (1.0 - scroll * 1.5).max(0.0)
}

/// Clouds only show once the day is well underway
pub fn cloud_alpha(scroll: f64) -> f64 {
    ((scroll - 0.15) * 1.5).clamp(0.0, 0.85)
}

/// Sun center height, from low at night to high by day
pub fn sun_y(viewport: Viewport, scroll: f64) -> f64 {
    let base = viewport.h() * 0.85;
    let top = viewport.h() * 0.25;
    base - clamp01(scroll) * (base - top)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Star {
    /// Normalized position
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub base_alpha: f64,
    pub blink_speed: f64,
    pub blink_offset: f64,
    /// Set once the constellation forms
    pub target: Option<Point>,
}

impl Star {
    fn flicker(&self, time: f64) -> f64 {
        ((time * self.blink_speed + self.blink_offset).sin() + 1.0) / 2.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Puff {
    pub x_off: f64,
    pub y_off: f64,
    pub radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cloud {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub scale: f64,
    pub puffs: Vec<Puff>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunParticle {
    pub x: f64,
    pub y: f64,
    pub vy: f64,
    pub life: f64,
}

/// Typed-code trigger for the star alignment
#[derive(Clone, Debug)]
struct Constellation {
    code: Vec<char>,
    typed: VecDeque<char>,
    active: bool,
    aurora: f64,
}

/// Gradient sky, stars, sun and clouds. Independent of the page kind.
pub struct SkyRenderer {
    viewport: Viewport,
    stars: Vec<Star>,
    clouds: Vec<Cloud>,
    particles: Vec<SunParticle>,
    constellation: Constellation,
    rng: StdRng,
}

impl SkyRenderer {
    pub fn new(viewport: Viewport, mut rng: StdRng, code: &str) -> Self {
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                x: rng.random(),
                y: rng.random::<f64>() * 0.75,
                size: rng.random::<f64>() * 2.0,
                base_alpha: rng.random(),
                blink_speed: 0.02 + rng.random::<f64>() * 0.04,
                blink_offset: rng.random::<f64>() * TAU,
                target: None,
            })
            .collect();

        // One cloud per horizontal slot so they start spread out
        let slot = viewport.w() / CLOUD_COUNT as f64;
        let clouds = (0..CLOUD_COUNT)
            .map(|i| {
                let puffs = (0..rng.random_range(6..=10))
                    .map(|_| Puff {
                        x_off: (rng.random::<f64>() - 0.5) * 120.0,
                        y_off: (rng.random::<f64>() - 0.5) * 40.0,
                        radius: 25.0 + rng.random::<f64>() * 30.0,
                    })
                    .collect();
                Cloud {
                    x: i as f64 * slot + rng.random::<f64>() * slot * 0.8,
                    y: viewport.h() * (0.10 + rng.random::<f64>() * 0.45),
                    speed: 0.15 + rng.random::<f64>() * 0.2,
                    scale: 0.6 + rng.random::<f64>() * 0.6,
                    puffs,
                }
            })
            .collect();

        SkyRenderer {
            viewport,
            stars,
            clouds,
            particles: Vec::new(),
            constellation: Constellation {
                code: code.to_lowercase().chars().collect(),
                typed: VecDeque::new(),
                active: false,
                aurora: 0.0,
            },
            rng,
        }
    }

    /// Stars are normalized and clouds wrap on their own, so only the size changes
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn particles(&self) -> &[SunParticle] {
        &self.particles
    }

    pub fn constellation_active(&self) -> bool {
        self.constellation.active
    }

    pub fn aurora_alpha(&self) -> f64 {
        self.constellation.aurora
    }

    /// Feeds a typed key; returns true when it completed the code
    pub fn key(&mut self, key: char) -> bool {
        let c = &mut self.constellation;
        if c.active || c.code.is_empty() {
            return false;
        }
        c.typed.push_back(key.to_ascii_lowercase());
        while c.typed.len() > c.code.len() {
            c.typed.pop_front();
        }
        if c.typed.iter().eq(c.code.iter()) {
            self.align_stars();
            return true;
        }
        false
    }

    /// Sends the first stars toward the constellation. One-shot.
    pub fn align_stars(&mut self) {
        if self.constellation.active {
            return;
        }
        self.constellation.active = true;
        info!("stars aligning");

        let spread = if self.viewport.is_mobile() { 2.2 } else { 1.0 };
        for (star, &(tx, ty)) in self.stars.iter_mut().zip(CONSTELLATION.iter()) {
            let tx = 0.5 + (tx - 0.5) * spread;
            star.target = Some(Point::new(
                tx + (self.rng.random::<f64>() - 0.5) * 0.015,
                ty + (self.rng.random::<f64>() - 0.5) * 0.015,
            ));
            star.size = 2.5 + self.rng.random::<f64>();
            star.base_alpha = 1.0;
        }
    }

    pub fn render(&mut self, canvas: &mut Canvas, time: f64, scroll: f64) {
        self.draw_background(canvas, time, scroll);
        if self.constellation.active {
            if self.constellation.aurora < 1.0 {
                self.constellation.aurora = (self.constellation.aurora + 0.005).min(1.0);
            }
            self.draw_aurora(canvas, time);
        }
        self.draw_sun(canvas, scroll);
        self.draw_clouds(canvas, scroll);
    }

    fn draw_background(&mut self, canvas: &mut Canvas, time: f64, scroll: f64) {
        let (w, h) = (self.viewport.w(), self.viewport.h());
        let stops = sky_stops(scroll);
        let gradient = Gradient::new(STOP_OFFSETS.iter().zip(stops).map(|(&t, c)| (t, c.opaque())));
        canvas.fill(
            &Shape::Rect(Rect::new(0.0, 0.0, w, h)),
            &Paint::Vertical { y0: 0.0, y1: h, gradient },
        );

        let fade = day_fade(scroll);
        if fade <= 0.01 {
            return;
        }
        let white = Rgb::WHITE.opaque();
        let constellation = self.constellation.active;
        let connect = constellation && self.constellation.aurora >= 0.5;
        canvas.scoped(|c| {
            if connect {
                let line = Rgb::WHITE.with_alpha(0.15);
                for (first, last) in LETTERS {
                    let points: Vec<Point> = self.stars[first..=last]
                        .iter()
                        .map(|s| Point::new(s.x * w, s.y * h))
                        .collect();
                    for pair in points.windows(2) {
                        c.stroke_line(pair[0], pair[1], 1.0, Stroke::Solid(line));
                    }
                }
            }

            for star in &mut self.stars {
                if let Some(target) = star.target {
                    star.x += (target.x - star.x) * 0.03;
                    star.y += (target.y - star.y) * 0.03;
                }
                let flicker = star.flicker(time);
                let alpha = if star.target.is_some() {
                    0.8 + flicker * 0.2
                } else {
                    star.base_alpha * flicker
                };
                c.set_alpha(alpha * fade);
                c.fill_circle(Point::new(star.x * w, star.y * h), star.size, &Paint::Solid(white));
            }
        });
    }

    fn draw_aurora(&self, canvas: &mut Canvas, time: f64) {
        let alpha = self.constellation.aurora * 0.4;
        canvas.scoped(|c| {
            c.set_composite(Composite::Screen);
            c.set_alpha(alpha);
            self.draw_wave(c, time * 0.01, Rgb::hex(0x00ffcc), 60.0, 200.0);
            self.draw_wave(c, time * 0.015 + 2.0, Rgb::hex(0xff00ff), 80.0, 250.0);
        });
    }

    fn draw_wave(&self, canvas: &mut Canvas, offset: f64, color: Rgb, amplitude: f64, period: f64) {
        let (w, h) = (self.viewport.w(), self.viewport.h());
        let mut points = vec![Point::new(0.0, h)];
        let mut x = 0.0;
        while x <= w {
            let y = h * 0.4
                + (x / period + offset).sin() * amplitude
                + (x / (period * 0.5) - offset).sin() * amplitude * 0.5;
            points.push(Point::new(x, y));
            x += 20.0;
        }
        points.push(Point::new(w, h));
        let gradient = Gradient::new([(0.0, color.opaque()), (1.0, color.with_alpha(0.0))]);
        canvas.fill_polygon(&points, &Paint::Vertical { y0: 0.0, y1: h, gradient });
    }

    fn draw_sun(&mut self, canvas: &mut Canvas, scroll: f64) {
        let x = self.viewport.w() * 0.9;
        let y = sun_y(self.viewport, scroll);
        let size = self.viewport.h() * 0.28;
        let center = Point::new(x, y);
        let gradient = Gradient::new([
            (0.0, SUN.opaque()),
            (0.6, Rgb::hex(0xff4400).opaque()),
            (1.0, Rgb::hex(0xff0055).opaque()),
        ]);
        canvas.fill_circle(center, size, &Paint::Radial { center, radius: size, gradient });

        if self.rng.random::<f64>() > 0.8 {
            self.particles.push(SunParticle {
                x: x + (self.rng.random::<f64>() - 0.5) * size,
                y: y + (self.rng.random::<f64>() - 0.5) * size * 0.5,
                vy: -0.5 - self.rng.random::<f64>(),
                life: 1.0,
            });
        }
        for p in &mut self.particles {
            p.y += p.vy;
            p.life -= 0.01;
        }
        self.particles.retain(|p| p.life > 0.0);

        canvas.scoped(|c| {
            for p in &self.particles {
                c.set_alpha(p.life);
                c.fill_rect(p.x, p.y, 2.0, 2.0, SUN);
            }
        });
    }

    fn draw_clouds(&mut self, canvas: &mut Canvas, scroll: f64) {
        let alpha = cloud_alpha(scroll);
        if alpha <= 0.0 {
            return;
        }
        let (w, h) = (self.viewport.w(), self.viewport.h());
        for cloud in &mut self.clouds {
            cloud.x += cloud.speed;
            if cloud.x > w + 200.0 {
                cloud.x = -200.0;
                cloud.y = h * (0.10 + self.rng.random::<f64>() * 0.45);
            }
            for puff in &cloud.puffs {
                let center = Point::new(
                    cloud.x + puff.x_off * cloud.scale,
                    cloud.y + puff.y_off * cloud.scale,
                );
                let radius = puff.radius * cloud.scale;
                let gradient = Gradient::new([
                    (0.0, Rgba::new(Rgb::WHITE, alpha)),
                    (0.4, Rgba::new(Rgb::WHITE, alpha * 0.8)),
                    (1.0, Rgba::new(Rgb::WHITE, 0.0)),
                ]);
                canvas.fill_circle(center, radius, &Paint::Radial { center, radius, gradient });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn sky(w: u32, h: u32) -> SkyRenderer {
        SkyRenderer::new(Viewport::new(w, h), StdRng::seed_from_u64(2), "lau")
    }

    #[test]
    fn test_stops_at_extremes() {
        assert_eq!(sky_stops(0.0), NIGHT);
        assert_eq!(sky_stops(1.0), DAY);
        assert_eq!(sky_stops(0.5)[0], Rgb::new(1, 39, 76));
    }

    #[test]
    fn test_fades() {
        assert_eq!(day_fade(0.0), 1.0);
        assert_eq!(day_fade(1.0), 0.0);
        assert_eq!(cloud_alpha(0.1), 0.0);
        assert_eq!(cloud_alpha(1.0), 0.85);
    }

    #[test]
    fn test_sun_rises_with_scroll() {
        let vp = Viewport::new(1000, 1000);
        assert!((sun_y(vp, 0.0) - 850.0).abs() < 1e-9);
        assert!((sun_y(vp, 1.0) - 250.0).abs() < 1e-9);
        assert!(sun_y(vp, 0.3) > sun_y(vp, 0.6));
    }

    #[test]
    fn test_populations() {
        let s = sky(1280, 720);
        assert_eq!(s.stars().len(), STAR_COUNT);
        assert!(s.stars().iter().all(|st| st.y < 0.75));
        assert_eq!(s.clouds().len(), CLOUD_COUNT);
        assert!(s.clouds().iter().all(|c| (6..=10).contains(&c.puffs.len())));
    }

    #[test]
    fn test_clouds_hold_still_at_night() {
        let mut s = sky(200, 100);
        let mut canvas = Canvas::new(200, 100);
        let before: Vec<f64> = s.clouds().iter().map(|c| c.x).collect();
        s.render(&mut canvas, 1.0, 0.0);
        let after: Vec<f64> = s.clouds().iter().map(|c| c.x).collect();
        assert_eq!(before, after);
        s.render(&mut canvas, 2.0, 0.9);
        assert!(s.clouds().iter().zip(&before).all(|(c, x)| c.x > *x));
    }

    #[test]
    fn test_cloud_wraps_to_left_edge() {
        let mut s = sky(400, 300);
        let mut canvas = Canvas::new(400, 300);
        s.clouds[0].x = 400.0 + 200.0;
        let speed = s.clouds[0].speed;
        let others: Vec<f64> = s.clouds[1..].iter().map(|c| c.x + c.speed).collect();
        s.render(&mut canvas, 1.0, 0.9);

        let cloud = &s.clouds()[0];
        assert_eq!(cloud.x, -200.0);
        assert!(speed > 0.0);
        assert!((30.0..=165.0).contains(&cloud.y), "cloud at y {}", cloud.y);
        let moved: Vec<f64> = s.clouds()[1..].iter().map(|c| c.x).collect();
        assert_eq!(moved, others);
    }

    #[test]
    fn test_narrow_sky_spreads_constellation() {
        let target_x = |width: u32, star: usize| {
            let mut s = sky(width, 800);
            s.align_stars();
            s.stars()[star].target.map(|t| t.x).unwrap()
        };
        // 0.35 and 0.65 pushed out 2.2x from the center, with +-0.0075 jitter
        assert!((target_x(600, 0) - 0.17).abs() <= 0.008);
        assert!((target_x(600, 17) - 0.83).abs() <= 0.008);
        assert!((target_x(1280, 0) - 0.35).abs() <= 0.008);
        assert!((target_x(1280, 17) - 0.65).abs() <= 0.008);
    }

    #[test]
    fn test_particles_expire() {
        let mut s = sky(200, 100);
        let mut canvas = Canvas::new(200, 100);
        for t in 0..500 {
            s.render(&mut canvas, t as f64, 0.2);
            assert!(s.particles().iter().all(|p| p.life > 0.0));
            // at most one spawn per frame, each lives about 100 frames
            assert!(s.particles().len() <= 101);
        }
    }

    #[test]
    fn test_code_aligns_stars_once() {
        let mut s = sky(1280, 720);
        assert!(!s.key('x'));
        assert!(!s.key('L'));
        assert!(!s.key('a'));
        assert!(s.key('u'));
        assert!(s.constellation_active());
        assert!(s.stars()[..18].iter().all(|st| st.target.is_some()));
        assert!(s.stars()[18..].iter().all(|st| st.target.is_none()));
        assert!(!s.key('u'));
    }

    #[test]
    fn test_aurora_ramps_up() {
        let mut s = sky(160, 90);
        let mut canvas = Canvas::new(160, 90);
        s.align_stars();
        for t in 0..300 {
            s.render(&mut canvas, t as f64, 0.0);
        }
        assert_eq!(s.aurora_alpha(), 1.0);
    }

    #[test]
    fn test_render_leaves_state_clean() {
        let mut s = sky(120, 80);
        let mut canvas = Canvas::new(120, 80);
        s.align_stars();
        s.render(&mut canvas, 10.0, 0.3);
        assert_eq!(*canvas.state(), crate::graphics::DrawState::default());
        assert_eq!(canvas.pixel(0, 0)[3], 255);
    }
}
