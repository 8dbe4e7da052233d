use rand::rngs::StdRng;
use tracing::info;

use crate::artifact::MenuLight;
use crate::assets::SceneAssets;
use crate::color::{Rgb, Rgba};
use crate::geometry::ceremonial::{Ceremonial, Pyramid};
use crate::geometry::mountains::Facet;
use crate::geometry::rural::Village;
use crate::geometry::urban::{LayerCounts, Skyline};
use crate::geometry::{self, Appearance, Population, SceneGeometry, SceneKind, Viewport};
use crate::graphics::{Canvas, Composite, Gradient, Paint, Rect, Shape};
use crate::math::{clamp01, Point};

const GROUND: Rgb = Rgb::hex(0x080101);
const MIST: Rgb = Rgb::hex(0x00ffcc);
const WINDOW_LIT: Rgb = Rgb::hex(0xffaa00);
const WINDOW_DARK: Rgb = Rgb::hex(0x222222);

/// Off-screen pyramid layers, composited once per regeneration
struct PyramidLayers {
    back: Canvas,
    front: Canvas,
}

/// Draws the page's landscape on top of the sky: the shared mountain range,
/// then the population of the page kind.
pub struct LandscapeRenderer {
    viewport: Viewport,
    geometry: SceneGeometry,
    layers: Option<PyramidLayers>,
    rng: StdRng,
}

impl LandscapeRenderer {
    pub fn new(kind: SceneKind, viewport: Viewport, assets: &SceneAssets, mut rng: StdRng) -> Self {
        let geometry = geometry::generate(kind, viewport, assets, &mut rng);
        let mut renderer = LandscapeRenderer {
            viewport,
            geometry,
            layers: None,
            rng,
        };
        renderer.compose_layers();
        renderer.log_generated();
        renderer
    }

    pub fn kind(&self) -> SceneKind {
        self.geometry.kind
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn geometry(&self) -> &SceneGeometry {
        &self.geometry
    }

    /// Rebuilds every population from scratch, picking up `assets`
    pub fn regenerate(&mut self, assets: &SceneAssets) {
        self.geometry =
            geometry::generate(self.geometry.kind, self.viewport, assets, &mut self.rng);
        self.compose_layers();
        self.log_generated();
    }

    pub fn resize(&mut self, viewport: Viewport, assets: &SceneAssets) {
        self.viewport = viewport;
        self.regenerate(assets);
    }

    fn log_generated(&self) {
        let kind = self.geometry.kind;
        let viewport = self.viewport;
        match &self.geometry.population {
            Population::Urban(_) => {
                let counts = LayerCounts::for_viewport(viewport);
                info!(%kind, %viewport, buildings = counts.total(), "landscape generated");
            }
            Population::Rural(village) => info!(
                %kind,
                %viewport,
                houses = village.houses.len(),
                foreground = village.foreground.len(),
                "landscape generated"
            ),
            Population::Ceremonial(scene) => info!(
                %kind,
                %viewport,
                pyramids = scene.background.len() + scene.cities.len(),
                "landscape generated"
            ),
            Population::Generic => info!(%kind, %viewport, "landscape generated"),
        }
    }

    fn compose_layers(&mut self) {
        self.layers = match &self.geometry.population {
            Population::Ceremonial(scene) => Some(PyramidLayers::compose(self.viewport, scene)),
            _ => None,
        };
    }

    pub fn render(&mut self, canvas: &mut Canvas, time: f64, scroll: f64, light: MenuLight) {
        draw_mountains(canvas, &self.geometry.mountains);
        let viewport = self.viewport;
        let horizon = self.geometry.kind.horizon(viewport);
        match &mut self.geometry.population {
            Population::Urban(skyline) => {
                draw_urban(canvas, skyline, viewport, horizon, time, scroll, light)
            }
            Population::Rural(village) => {
                draw_rural(canvas, village, viewport, time, scroll, &mut self.rng)
            }
            Population::Ceremonial(scene) => {
                draw_ceremonial(canvas, scene, self.layers.as_ref(), viewport, horizon, time)
            }
            Population::Generic => {
                canvas.fill_rect(0.0, horizon, viewport.w(), viewport.h() - horizon, GROUND)
            }
        }
    }
}

/// Mountain facets, never glowing whatever state the canvas arrives in
pub fn draw_mountains(canvas: &mut Canvas, facets: &[Facet]) {
    canvas.scoped(|c| {
        c.clear_shadow();
        c.set_composite(Composite::SourceOver);
        for facet in facets {
            c.fill_polygon(&facet.points, &Paint::from(facet.color));
            let mut outline = facet.points.clone();
            if let Some(&first) = facet.points.first() {
                outline.push(first);
            }
            c.stroke_polyline(&outline, 1.0, facet.color.opaque());
        }
    });
}

fn draw_structure(canvas: &mut Canvas, appearance: &Appearance, x: f64, y: f64, w: f64, h: f64) {
    match appearance {
        Appearance::Sprite(sprite) => canvas.draw_sprite(sprite, x, y, w, h),
        Appearance::Block(color) => canvas.fill_rect(x, y, w, h, *color),
    }
}

fn draw_urban(
    canvas: &mut Canvas,
    skyline: &Skyline,
    viewport: Viewport,
    horizon: f64,
    time: f64,
    scroll: f64,
    light: MenuLight,
) {
    let (w, h) = (viewport.w(), viewport.h());
    let s = clamp01(scroll);
    let night = (1.0 - s * 2.5).max(0.0);
    let glow = light.shadow();

    let back = Rgb::hex(0x050505).lerp(Rgb::hex(0x151515), s);
    for b in &skyline.back {
        let left = b.x_rel * w - b.width / 2.0;
        canvas.fill_rect(left, horizon - 2.0 - b.height, b.width, b.height, back);
    }
    let mid = Rgb::hex(0x0a0a0a).lerp(Rgb::hex(0x202025), s);
    for b in &skyline.mid {
        canvas.fill_rect(b.x_rel * w - b.width / 2.0, horizon - b.height, b.width, b.height, mid);
    }
    canvas.fill_rect(0.0, horizon - 2.0, w, h - horizon + 2.0, GROUND);

    let ground_line = Rgb::hex(0x111111).lerp(Rgb::hex(0x333333), s);
    if night > 0.01 {
        canvas.scoped(|c| {
            c.set_alpha(night);
            c.set_shadow(10.0 * night, glow);
            c.fill_rect(0.0, horizon, w, 4.0, ground_line);
        });
    } else {
        canvas.fill_rect(0.0, horizon, w, 4.0, ground_line);
    }

    let fill = Rgb::hex(0x1a0404).lerp(Rgb::hex(0x2b2b35), s);
    let y = horizon + 5.0;
    for b in &skyline.front {
        let x = b.x_rel * w;
        canvas.scoped(|c| {
            c.set_shadow(10.0 * night, glow);
            c.fill_rect(x - b.width / 2.0, y - b.height, b.width, b.height, fill);
        });
        if b.antenna {
            canvas.fill_rect(x - 1.0, y - b.height - 10.0, 2.0, 10.0, Rgb::hex(0x151515));
        }
        if night <= 0.01 {
            continue;
        }
        let (start, end) = (x - b.width / 2.0 + 4.0, x + b.width / 2.0 - 4.0);
        canvas.scoped(|c| {
            for floor in &b.floors {
                let mut wx = start;
                while wx < end {
                    let (color, alpha, blur) = if floor.window_lit(wx, time) {
                        (WINDOW_LIT, 0.95, 8.0)
                    } else {
                        (WINDOW_DARK, 0.5, 0.0)
                    };
                    c.set_shadow(blur * night, color.opaque());
                    c.set_alpha(alpha * night);
                    c.fill_rect(wx, y - floor.y_offset - 1.0, 3.0, 5.0, color);
                    wx += 8.0;
                }
            }
        });
    }

    let monument = &skyline.monument;
    let (mx, mw, mh) = (monument.x - monument.width / 2.0, monument.width, monument.height);
    canvas.scoped(|c| {
        if night > 0.01 {
            c.set_shadow(10.0 * night, glow);
        }
        match &monument.sprite {
            Some(sprite) => {
                c.set_brightness((1.0 - night).max(0.0));
                c.draw_sprite(sprite, mx, monument.base_y - mh, mw, mh);
            }
            None => c.fill_rect(mx, monument.base_y - mh, mw, mh, Rgb::hex(0x0a0a0e)),
        }
    });
}

fn draw_rural(
    canvas: &mut Canvas,
    village: &mut Village,
    viewport: Viewport,
    time: f64,
    scroll: f64,
    rng: &mut StdRng,
) {
    let (w, h) = (viewport.w(), viewport.h());
    let water_line = h * 0.65;
    let day = clamp01((scroll - 0.1) * 3.0);
    let night = 1.0 - day;

    let mut hills = vec![Point::new(0.0, h)];
    if let Some(first) = village.hills.first() {
        hills.push(Point::new(0.0, first.y));
    }
    hills.extend(village.hills.iter().copied());
    hills.push(Point::new(w, h));
    canvas.fill_polygon(&hills, &Paint::from(Rgb::hex(0x030508).lerp(Rgb::hex(0x0e1218), day)));

    if day > 0.01 {
        canvas.scoped(|c| {
            c.set_alpha(day * 0.8);
            for house in village.houses.iter().filter(|h| h.y > -10.0 && h.y < water_line) {
                draw_structure(c, &house.appearance, house.x, house.y, house.w, house.h);
            }
        });
    }

    if night > 0.01 {
        canvas.scoped(|c| {
            c.set_composite(Composite::Lighter);
            for l in &village.lights {
                c.set_alpha((0.7 + (time * l.blink_speed + l.phase).sin() * 0.3) * night);
                c.fill_circle(Point::new(l.x, l.y), l.size, &Paint::from(l.color));
            }
        });
    }

    let lake = Rect::new(0.0, water_line, w, h - water_line);
    let water = Gradient::new([
        (0.0, Rgb::hex(0x050a14).lerp(Rgb::hex(0x0a1020), day).opaque()),
        (0.5, Rgb::hex(0x0f1928).lerp(Rgb::hex(0x152035), day).opaque()),
        (1.0, Rgb::new(10, 15, 30).opaque()),
    ]);
    canvas.fill(
        &Shape::Rect(lake),
        &Paint::Vertical {
            y0: water_line,
            y1: h,
            gradient: water,
        },
    );

    if lake.h > 10.0 && night > 0.01 {
        canvas.scoped(|c| {
            c.set_clip(Some(lake));
            c.set_alpha(0.3 * night);
            c.set_composite(Composite::Lighter);
            for l in village.lights.iter().step_by(3) {
                let rel = water_line - l.y;
                if rel <= 0.0 || rel >= h * 0.35 {
                    continue;
                }
                c.fill(
                    &Shape::Ellipse {
                        center: Point::new(l.x, water_line + rel * 1.2),
                        rx: l.size * 2.0,
                        ry: l.size * 6.0 * 1.2,
                        rotation: 0.0,
                    },
                    &Paint::from(l.color),
                );
            }
        });
    }

    let ground_y = h * 0.85;
    let mut ground = vec![Point::new(0.0, h), Point::new(0.0, ground_y)];
    let mut x = 0.0;
    while x <= w {
        ground.push(Point::new(x, ground_y + (x * 0.02).sin() * 10.0 + 5.0));
        x += 100.0;
    }
    ground.push(Point::new(w, ground_y + (w * 0.02).sin() * 10.0 + 5.0));
    ground.push(Point::new(w, h));
    canvas.fill_polygon(&ground, &Paint::from(Rgb::hex(0x010101)));

    for house in village.foreground.iter().filter(|h| h.y > ground_y - 20.0) {
        if day > 0.01 {
            canvas.scoped(|c| {
                c.set_alpha(day);
                if !house.appearance.is_block() {
                    c.set_shadow(10.0, Rgb::BLACK.with_alpha(0.5));
                }
                draw_structure(c, &house.appearance, house.x, house.y - house.h, house.w, house.h);
            });
        }
        if night > 0.01 {
            canvas.scoped(|c| {
                c.set_composite(Composite::Lighter);
                c.set_alpha(night);
                c.set_shadow(15.0 * night, Rgb::hex(0xffaa00).opaque());
                c.fill_circle(
                    Point::new(house.x + house.w / 2.0, house.y - house.h / 3.0),
                    3.0,
                    &Paint::from(Rgb::hex(0xffcc66)),
                );
            });
        }
    }

    if day > 0.1 {
        canvas.scoped(|c| {
            c.set_alpha(day * 0.9);
            for petal in &mut village.petals {
                petal.advance(time, viewport, rng);
                c.fill(
                    &Shape::Ellipse {
                        center: Point::new(petal.x, petal.y),
                        rx: petal.size,
                        ry: petal.size * 0.6,
                        rotation: petal.rotation,
                    },
                    &Paint::from(petal.color),
                );
            }
        });
    }
}

impl PyramidLayers {
    fn compose(viewport: Viewport, scene: &Ceremonial) -> Self {
        let (w, h) = (viewport.width as usize, viewport.height as usize);
        let mut back = Canvas::new(w, h);
        for p in &scene.background {
            back.scoped(|c| {
                c.set_alpha(p.alpha);
                // Distant pyramids read as silhouettes
                c.set_brightness(0.0);
                draw_pyramid(c, p);
            });
        }
        let mut front = Canvas::new(w, h);
        for p in &scene.cities {
            draw_pyramid(&mut front, p);
        }
        PyramidLayers { back, front }
    }
}

fn draw_pyramid(canvas: &mut Canvas, p: &Pyramid) {
    draw_structure(
        canvas,
        &p.appearance,
        p.x - p.width / 2.0,
        p.base_y - p.height,
        p.width,
        p.height,
    );
}

fn draw_ceremonial(
    canvas: &mut Canvas,
    scene: &mut Ceremonial,
    layers: Option<&PyramidLayers>,
    viewport: Viewport,
    horizon: f64,
    time: f64,
) {
    let (w, h) = (viewport.w(), viewport.h());
    canvas.fill_rect(0.0, horizon - 5.0, w, h - horizon + 5.0, Rgb::hex(0x040405));
    if let Some(layers) = layers {
        canvas.draw_layer(&layers.back);
        canvas.draw_layer(&layers.front);
    }

    let mist = Mist { viewport, horizon, time };
    mist.draw(canvas, 0.002, 6.0, -5.0, 0.5, 0.003);
    mist.draw(canvas, 0.004, 9.0, 0.0, 0.3, 0.005);

    canvas.scoped(|c| {
        c.set_composite(Composite::Lighter);
        c.set_shadow(10.0, MIST.opaque());
        for glyph in &mut scene.glyphs {
            glyph.advance(viewport);
            c.set_alpha(glyph.opacity * glyph.blink(time));
            c.fill_rect(glyph.x, glyph.y, glyph.size, glyph.size, MIST);
        }
    });
}

struct Mist {
    viewport: Viewport,
    horizon: f64,
    time: f64,
}

impl Mist {
    fn draw(
        &self,
        canvas: &mut Canvas,
        speed: f64,
        amplitude: f64,
        offset_y: f64,
        alpha: f64,
        frequency: f64,
    ) {
        let (w, h) = (self.viewport.w(), self.viewport.h());
        let fog_height = h * 0.02;
        let bottom = self.horizon + 25.0;
        let t = self.time;

        let mut points = vec![Point::new(0.0, bottom)];
        let mut x = 0.0;
        while x <= w {
            let y = self.horizon - fog_height
                + (x * frequency + t * speed).sin() * amplitude
                + (x * frequency * 2.0 - t * speed * 1.2).cos() * amplitude * 0.4
                + offset_y
                + 18.0;
            points.push(Point::new(x, y));
            x += 10.0;
        }
        points.push(Point::new(w, bottom));

        let gradient = Gradient::new([
            (0.0, Rgba::TRANSPARENT),
            (0.5, MIST.opaque()),
            (1.0, Rgb::BLACK.with_alpha(0.1)),
        ]);
        canvas.scoped(|c| {
            c.set_composite(Composite::Screen);
            c.set_alpha(alpha * 0.5);
            c.set_shadow(20.0, MIST.opaque());
            c.fill_polygon(
                &points,
                &Paint::Vertical {
                    y0: self.horizon - fog_height - 20.0,
                    y1: bottom,
                    gradient,
                },
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Category, Sprite};
    use crate::graphics::DrawState;
    use image::{Rgba as Pixel, RgbaImage};
    use rand::SeedableRng;

    fn renderer(kind: SceneKind, w: u32, h: u32) -> LandscapeRenderer {
        LandscapeRenderer::new(
            kind,
            Viewport::new(w, h),
            &SceneAssets::default(),
            StdRng::seed_from_u64(11),
        )
    }

    fn light() -> MenuLight {
        MenuLight::from_expansion(0.0)
    }

    #[test]
    fn test_mountains_ignore_inherited_glow() {
        let r = renderer(SceneKind::Generic, 320, 200);
        let mut canvas = Canvas::new(320, 200);
        canvas.set_shadow(30.0, Rgb::hex(0xff0000).opaque());
        draw_mountains(&mut canvas, &r.geometry().mountains);

        // Palette colors are never redder than they are blue; a red halo would be
        let mut painted = 0;
        for y in 0..200 {
            for x in 0..320 {
                let [red, _, blue, a] = canvas.pixel(x, y);
                if a > 0 {
                    painted += 1;
                    assert!(red <= blue, "glow leaked at ({x}, {y})");
                }
            }
        }
        assert!(painted > 0);
        // The caller's shadow comes back afterwards
        assert_eq!(canvas.state().shadow_blur, 30.0);
    }

    #[test]
    fn test_every_kind_restores_draw_state() {
        for kind in SceneKind::ALL {
            let mut r = renderer(kind, 400, 300);
            let mut canvas = Canvas::new(400, 300);
            for scroll in [0.0, 0.3, 1.0] {
                r.render(&mut canvas, 42.0, scroll, light());
                assert_eq!(*canvas.state(), DrawState::default(), "{kind} leaked draw state");
            }
        }
    }

    #[test]
    fn test_generic_draws_flat_ground() {
        let mut r = renderer(SceneKind::Generic, 200, 100);
        let mut canvas = Canvas::new(200, 100);
        r.render(&mut canvas, 0.0, 0.0, light());
        let [red, g, b, a] = canvas.pixel(100, 95);
        assert_eq!((red, g, b, a), (0x08, 0x01, 0x01, 0xff));
    }

    #[test]
    fn test_resize_regenerates() {
        let mut r = renderer(SceneKind::Urban, 1280, 720);
        match &r.geometry().population {
            Population::Urban(s) => assert_eq!(s.back.len(), 40),
            other => panic!("unexpected population {other:?}"),
        }
        r.resize(Viewport::new(600, 800), &SceneAssets::default());
        assert_eq!(r.viewport(), Viewport::new(600, 800));
        match &r.geometry().population {
            Population::Urban(s) => assert_eq!(s.back.len(), 20),
            other => panic!("unexpected population {other:?}"),
        }
    }

    #[test]
    fn test_regenerate_picks_up_sprites() {
        let mut r = renderer(SceneKind::Ceremonial, 800, 600);
        let mut assets = SceneAssets::default();
        assets.insert(
            Category::Pyramids,
            Sprite::new(RgbaImage::from_pixel(4, 2, Pixel([200, 150, 100, 255]))),
        );
        r.regenerate(&assets);
        match &r.geometry().population {
            Population::Ceremonial(scene) => {
                assert!(scene.cities.iter().all(|p| !p.appearance.is_block()));
                assert!(scene.cities.iter().all(|p| (p.height - p.width * 0.5).abs() < 1e-9));
            }
            other => panic!("unexpected population {other:?}"),
        }
    }

    #[test]
    fn test_cached_layers_only_for_ceremonial() {
        assert!(renderer(SceneKind::Ceremonial, 300, 200).layers.is_some());
        assert!(renderer(SceneKind::Urban, 300, 200).layers.is_none());
        assert!(renderer(SceneKind::Rural, 300, 200).layers.is_none());
    }
}
