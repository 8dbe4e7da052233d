use std::f64::consts::{PI, TAU};

use rand::Rng;

use crate::assets::{Category, SceneAssets};
use crate::color::Rgb;
use crate::geometry::{sized_structure, Appearance, Viewport};
use crate::math::Point;

/// Horizontal sampling step of the hill profile
pub const HILL_STEP: u32 = 4;
/// Every fifth sample ends up in the silhouette
pub const SILHOUETTE_SPACING: u32 = 20;
/// One foreground house per this many pixels of width
pub const FOREGROUND_SPACING: u32 = 30;
pub const PETAL_COUNT: usize = 40;

/// A house seen from afar or up close
#[derive(Clone, Debug, PartialEq)]
pub struct House {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub appearance: Appearance,
}

/// Window light of a distant house
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: Rgb,
    pub blink_speed: f64,
    pub phase: f64,
}

/// Falling maquilishuat blossom
#[derive(Clone, Debug, PartialEq)]
pub struct Petal {
    pub x: f64,
    pub y: f64,
    pub speed_x: f64,
    pub speed_y: f64,
    pub size: f64,
    pub rotation: f64,
    pub rotation_speed: f64,
    pub color: Rgb,
}

impl Petal {
    /// Falls, sways and wraps; respawns at the top with a new x once it
    /// leaves the bottom edge
    pub fn advance<R: Rng>(&mut self, time: f64, viewport: Viewport, rng: &mut R) {
        let (w, h) = (viewport.w(), viewport.h());
        self.y += self.speed_y;
        self.x += (time * 0.01 + self.y * 0.01).sin() * 0.5 + self.speed_x * 0.1;
        self.rotation += self.rotation_speed;
        if self.y > h {
            self.y = -10.0;
            self.x = rng.random::<f64>() * w;
        }
        if self.x > w {
            self.x = 0.0;
        }
        if self.x < 0.0 {
            self.x = w;
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Village {
    pub hills: Vec<Point>,
    pub houses: Vec<House>,
    pub lights: Vec<PointLight>,
    /// Sorted by `y`, back to front
    pub foreground: Vec<House>,
    pub petals: Vec<Petal>,
}

/// Hill height at `x` before jitter
pub fn hill_profile(x: f64, base_y: f64) -> f64 {
    base_y - (x * 0.003).sin() * 40.0 - (x * 0.01).sin() * 15.0
}

/// Houses cluster where this holds, which lands them on the hillsides
pub fn is_village_ground(x: f64) -> bool {
    (x * 0.005).sin() > -0.4
}

pub fn generate<R: Rng>(viewport: Viewport, assets: &SceneAssets, rng: &mut R) -> Village {
    let (w, h) = (viewport.w(), viewport.h());
    let huts = assets.get(Category::Huts);
    let base_y = h * 0.55;

    let mut hills = Vec::new();
    let mut houses = Vec::new();
    let mut lights = Vec::new();

    let mut x = 0u32;
    while x <= viewport.width + HILL_STEP {
        let fx = x as f64;
        let y = hill_profile(fx, base_y) + rng.random::<f64>() * 5.0;
        if x % SILHOUETTE_SPACING == 0 {
            hills.push(Point::new(fx, y));
        }

        if is_village_ground(fx) {
            let cluster = rng.random_range(1..=3);
            for k in 0..cluster {
                let house_x = fx + (rng.random::<f64>() - 0.5) * 20.0;
                let house_y = y + rng.random::<f64>() * 30.0 + k as f64 * 5.0;
                let width = 8.0 + rng.random::<f64>() * 6.0;
                let block = if rng.random::<f64>() > 0.5 {
                    Rgb::hex(0x1a1a1f)
                } else {
                    Rgb::hex(0x15151a)
                };
                let (height, appearance) = sized_structure(width, huts, 0.8, block, rng);
                houses.push(House {
                    x: house_x,
                    y: house_y,
                    w: width,
                    h: height,
                    appearance,
                });

                if rng.random::<f64>() > 0.5 {
                    lights.push(PointLight {
                        x: house_x,
                        y: house_y + height * 0.5,
                        size: 0.8 + rng.random::<f64>() * 1.2,
                        color: if rng.random::<f64>() > 0.7 {
                            Rgb::hex(0xffcc66)
                        } else {
                            Rgb::hex(0xffaa44)
                        },
                        blink_speed: 0.005 + rng.random::<f64>() * 0.02,
                        phase: rng.random::<f64>() * TAU,
                    });
                }
            }
        }
        x += HILL_STEP;
    }

    let front_y = h * 0.9;
    let mut foreground: Vec<House> = (0..viewport.width / FOREGROUND_SPACING)
        .map(|_| {
            let y = front_y + rng.random::<f64>() * 30.0;
            let width = 20.0 + rng.random::<f64>() * 15.0;
            let block = if rng.random::<f64>() > 0.5 {
                Rgb::hex(0x1a1a20)
            } else {
                Rgb::hex(0x22222a)
            };
            let (height, appearance) = sized_structure(width, huts, 0.8, block, rng);
            House {
                x: rng.random::<f64>() * w,
                y,
                w: width,
                h: height,
                appearance,
            }
        })
        .collect();
    foreground.sort_by(|a, b| a.y.total_cmp(&b.y));

    let petals = (0..PETAL_COUNT)
        .map(|_| Petal {
            x: rng.random::<f64>() * w,
            y: rng.random::<f64>() * h,
            speed_x: (rng.random::<f64>() - 0.5) * 1.5,
            speed_y: 0.5 + rng.random::<f64>() * 1.5,
            size: 2.0 + rng.random::<f64>() * 3.0,
            rotation: rng.random::<f64>() * PI,
            rotation_speed: (rng.random::<f64>() - 0.5) * 0.1,
            color: if rng.random::<f64>() > 0.5 {
                Rgb::hex(0xffb7c5)
            } else {
                Rgb::hex(0xffc0cb)
            },
        })
        .collect();

    Village {
        hills,
        houses,
        lights,
        foreground,
        petals,
    }
}
