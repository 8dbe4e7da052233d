use crate::assets::Sprite;
use crate::color::{Rgb, Rgba};
use crate::math::{edge_function, Point};

/// How source pixels combine with what is already on the canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Composite {
    #[default]
    SourceOver,
    /// Additive
    Lighter,
    Screen,
}

/// Axis-aligned rectangle in canvas pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    pub fn expand(self, d: f64) -> Rect {
        Rect::new(self.x - d, self.y - d, self.w + 2.0 * d, self.h + 2.0 * d)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }
}

/// Mutable drawing state, saved and restored as a unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    pub alpha: f64,
    pub composite: Composite,
    pub shadow_blur: f64,
    pub shadow_color: Rgba,
    /// Brightness filter multiplier (0 turns everything into a black silhouette)
    pub brightness: f64,
    pub clip: Option<Rect>,
}

impl Default for DrawState {
    fn default() -> Self {
        DrawState {
            alpha: 1.0,
            composite: Composite::SourceOver,
            shadow_blur: 0.0,
            shadow_color: Rgba::TRANSPARENT,
            brightness: 1.0,
            clip: None,
        }
    }
}

impl DrawState {
    pub fn has_shadow(&self) -> bool {
        self.shadow_blur > 0.0 && self.shadow_color.is_visible()
    }
}

/// Color stops over [0, 1]
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, Rgba)>,
}

impl Gradient {
    pub fn new(stops: impl IntoIterator<Item = (f64, Rgba)>) -> Self {
        let mut stops: Vec<(f64, Rgba)> = stops.into_iter().collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Gradient { stops }
    }

    pub fn at(&self, t: f64) -> Rgba {
        let Some(first) = self.stops.first() else {
            return Rgba::TRANSPARENT;
        };
        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                let span = (t1 - t0).max(f64::EPSILON);
                let k = (t - t0) / span;
                return Rgba::new(c0.rgb.lerp(c1.rgb, k), c0.a + (c1.a - c0.a) * k);
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    /// Vertical gradient from `y0` (t = 0) to `y1` (t = 1)
    Vertical { y0: f64, y1: f64, gradient: Gradient },
    /// Gradient along the segment `from` -> `to`
    Linear { from: Point, to: Point, gradient: Gradient },
    Radial { center: Point, radius: f64, gradient: Gradient },
}

impl From<Rgba> for Paint {
    fn from(c: Rgba) -> Self {
        Paint::Solid(c)
    }
}

impl From<Rgb> for Paint {
    fn from(c: Rgb) -> Self {
        Paint::Solid(c.opaque())
    }
}

impl Paint {
    fn at(&self, x: f64, y: f64) -> Rgba {
        match self {
            Paint::Solid(c) => *c,
            Paint::Vertical { y0, y1, gradient } => {
                let span = y1 - y0;
                let t = if span.abs() < f64::EPSILON { 0.0 } else { (y - y0) / span };
                gradient.at(t.clamp(0.0, 1.0))
            }
            Paint::Linear { from, to, gradient } => {
                let dx = to.x - from.x;
                let dy = to.y - from.y;
                let len2 = dx * dx + dy * dy;
                let t = if len2 < f64::EPSILON {
                    0.0
                } else {
                    ((x - from.x) * dx + (y - from.y) * dy) / len2
                };
                gradient.at(t.clamp(0.0, 1.0))
            }
            Paint::Radial { center, radius, gradient } => {
                let d = (x - center.x).hypot(y - center.y);
                gradient.at((d / radius.max(f64::EPSILON)).clamp(0.0, 1.0))
            }
        }
    }

    /// True when the color only depends on the row
    fn row_constant(&self) -> bool {
        matches!(self, Paint::Solid(_) | Paint::Vertical { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(Rect),
    Polygon(Vec<Point>),
    Ellipse {
        center: Point,
        rx: f64,
        ry: f64,
        rotation: f64,
    },
}

impl Shape {
    pub fn circle(center: Point, radius: f64) -> Shape {
        Shape::Ellipse {
            center,
            rx: radius,
            ry: radius,
            rotation: 0.0,
        }
    }

    /// Grows the shape outward by `d` pixels (exact for rects and ellipses,
    /// radial about the centroid for polygons)
    pub fn dilate(&self, d: f64) -> Shape {
        match self {
            Shape::Rect(r) => Shape::Rect(r.expand(d)),
            Shape::Ellipse { center, rx, ry, rotation } => Shape::Ellipse {
                center: *center,
                rx: rx + d,
                ry: ry + d,
                rotation: *rotation,
            },
            Shape::Polygon(points) => {
                let n = points.len().max(1) as f64;
                let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
                let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
                let grown = points
                    .iter()
                    .map(|p| {
                        let dx = p.x - cx;
                        let dy = p.y - cy;
                        let len = dx.hypot(dy);
                        if len < f64::EPSILON {
                            *p
                        } else {
                            Point::new(p.x + dx / len * d, p.y + dy / len * d)
                        }
                    })
                    .collect();
                Shape::Polygon(grown)
            }
        }
    }

    fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Shape::Rect(r) => (r.x, r.y, r.x + r.w, r.y + r.h),
            Shape::Polygon(points) => points.iter().fold(
                (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
            ),
            Shape::Ellipse { center, rx, ry, .. } => {
                let r = rx.max(*ry);
                (center.x - r, center.y - r, center.x + r, center.y + r)
            }
        }
    }
}

/// Stroke color for lines
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Stroke {
    Solid(Rgba),
    /// Blend from the first color at the start to the second at the end
    Gradient(Rgba, Rgba),
}

/// RGBA8 drawing surface with a canvas-like state model.
///
/// State changes (alpha, composite, shadow, brightness, clip) persist until
/// changed again, so routines that touch them should run inside [`Canvas::scoped`].
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl Canvas {
    /// Creates a fully transparent canvas
    pub fn new(width: usize, height: usize) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![0u8; width * height * 4],
            state: DrawState::default(),
            stack: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA at (x, y); transparent black outside the canvas
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let o = (y * self.width + x) * 4;
        [self.pixels[o], self.pixels[o + 1], self.pixels[o + 2], self.pixels[o + 3]]
    }

    /// Resets every pixel to transparent and the draw state to its defaults
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.state = DrawState::default();
        self.stack.clear();
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0u8; width * height * 4];
        self.state = DrawState::default();
        self.stack.clear();
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    /// Pops the last saved state; unbalanced restores are ignored
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    /// Runs `f` between a save and a restore
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Canvas) -> R) -> R {
        let depth = self.stack.len();
        self.save();
        let result = f(self);
        // Also unwinds any saves `f` forgot to restore
        self.stack.truncate(depth + 1);
        self.restore();
        result
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_composite(&mut self, composite: Composite) {
        self.state.composite = composite;
    }

    pub fn set_shadow(&mut self, blur: f64, color: Rgba) {
        self.state.shadow_blur = blur.max(0.0);
        self.state.shadow_color = color;
    }

    pub fn clear_shadow(&mut self) {
        self.state.shadow_blur = 0.0;
        self.state.shadow_color = Rgba::TRANSPARENT;
    }

    pub fn set_brightness(&mut self, brightness: f64) {
        self.state.brightness = brightness.max(0.0);
    }

    pub fn set_clip(&mut self, clip: Option<Rect>) {
        self.state.clip = clip;
    }

    /// Fills a shape, painting the current shadow first when one is set
    pub fn fill(&mut self, shape: &Shape, paint: &Paint) {
        if self.state.has_shadow() {
            self.paint_shadow(shape);
        }
        self.raster(shape, paint);
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: impl Into<Rgba>) {
        self.fill(&Shape::Rect(Rect::new(x, y, w, h)), &Paint::Solid(color.into()));
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64, paint: &Paint) {
        self.fill(&Shape::circle(center, radius), paint);
    }

    pub fn fill_polygon(&mut self, points: &[Point], paint: &Paint) {
        if points.len() < 3 {
            return;
        }
        self.fill(&Shape::Polygon(points.to_vec()), paint);
    }

    /// Strokes a segment. Hairlines (width <= 1) use Bresenham, wider strokes
    /// are filled as a quad.
    pub fn stroke_line(&mut self, from: Point, to: Point, width: f64, stroke: Stroke) {
        let paint = match stroke {
            Stroke::Solid(c) => Paint::Solid(c),
            Stroke::Gradient(a, b) => Paint::Linear {
                from,
                to,
                gradient: Gradient::new([(0.0, a), (1.0, b)]),
            },
        };
        if width <= 1.0 {
            if self.state.has_shadow() {
                self.paint_shadow(&line_quad(from, to, 1.0));
            }
            self.draw_line(from, to, &paint);
        } else {
            self.fill(&line_quad(from, to, width), &paint);
        }
    }

    pub fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Rgba) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], width, Stroke::Solid(color));
        }
    }

    /// Draws `sprite` scaled into the destination rectangle (nearest neighbour)
    pub fn draw_sprite(&mut self, sprite: &Sprite, x: f64, y: f64, w: f64, h: f64) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let dest = Rect::new(x, y, w, h);
        if self.state.has_shadow() {
            self.paint_shadow(&Shape::Rect(dest));
        }
        let (sw, sh) = (sprite.width() as f64, sprite.height() as f64);
        self.for_each_span(&Shape::Rect(dest), |canvas, row, x0, x1| {
            let v = (((row as f64 + 0.5 - y) / h) * sh).clamp(0.0, sh - 1.0) as u32;
            for col in x0..x1 {
                let u = (((col as f64 + 0.5 - x) / w) * sw).clamp(0.0, sw - 1.0) as u32;
                let [r, g, b, a] = sprite.pixel(u, v);
                if a == 0 {
                    continue;
                }
                canvas.blend(col, row, Rgba::new(Rgb::new(r, g, b), a as f64 / 255.0));
            }
        });
    }

    /// Composites another canvas of any size at the origin
    pub fn draw_layer(&mut self, layer: &Canvas) {
        let w = self.width.min(layer.width);
        let h = self.height.min(layer.height);
        for row in 0..h {
            for col in 0..w {
                let [r, g, b, a] = layer.pixel(col, row);
                if a == 0 {
                    continue;
                }
                self.blend(col, row, Rgba::new(Rgb::new(r, g, b), a as f64 / 255.0));
            }
        }
    }

    fn paint_shadow(&mut self, shape: &Shape) {
        const RINGS: usize = 3;
        let state = self.state;
        let ring_color = state.shadow_color.fade(0.3);
        let paint = Paint::Solid(ring_color);
        for ring in (1..=RINGS).rev() {
            let d = state.shadow_blur * 0.6 * ring as f64 / RINGS as f64;
            self.raster(&shape.dilate(d), &paint);
        }
    }

    fn raster(&mut self, shape: &Shape, paint: &Paint) {
        let row_constant = paint.row_constant();
        self.for_each_span(shape, |canvas, row, x0, x1| {
            let y = row as f64 + 0.5;
            if row_constant {
                let color = paint.at(x0 as f64 + 0.5, y);
                for col in x0..x1 {
                    canvas.blend(col, row, color);
                }
            } else {
                for col in x0..x1 {
                    let color = paint.at(col as f64 + 0.5, y);
                    canvas.blend(col, row, color);
                }
            }
        });
    }

    /// Bresenham hairline between two points
    fn draw_line(&mut self, from: Point, to: Point, paint: &Paint) {
        let (mut x0, mut y0, x1, y1) = (
            from.x.round() as isize,
            from.y.round() as isize,
            to.x.round() as isize,
            to.y.round() as isize,
        );
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            if self.in_clip(x0, y0) {
                let color = paint.at(x0 as f64 + 0.5, y0 as f64 + 0.5);
                self.blend(x0 as usize, y0 as usize, color);
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn in_clip(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        match self.state.clip {
            Some(clip) => clip.contains(Point::new(x as f64 + 0.5, y as f64 + 0.5)),
            None => true,
        }
    }

    /// Visits every covered pixel run `[x0, x1)` of `shape`, clipped to the
    /// canvas and the current clip rectangle. Coverage is sampled at pixel centers.
    fn for_each_span(
        &mut self,
        shape: &Shape,
        mut f: impl FnMut(&mut Canvas, usize, usize, usize),
    ) {
        let (mut left, mut top) = (0.0, 0.0);
        let (mut right, mut bottom) = (self.width as f64, self.height as f64);
        if let Some(clip) = self.state.clip {
            left = clip.x.max(left);
            top = clip.y.max(top);
            right = (clip.x + clip.w).min(right);
            bottom = (clip.y + clip.h).min(bottom);
        }
        let (bx0, by0, bx1, by1) = shape.bounds();
        if !(bx0.is_finite() && by0.is_finite() && bx1.is_finite() && by1.is_finite()) {
            return;
        }
        let col_lo = pixel_index(bx0.max(left));
        let col_hi = pixel_index(bx1.min(right));
        let row_lo = pixel_index(by0.max(top));
        let row_hi = pixel_index(by1.min(bottom));
        if col_hi <= col_lo || row_hi <= row_lo {
            return;
        }

        match shape {
            Shape::Rect(_) => {
                for row in row_lo..row_hi {
                    f(self, row, col_lo, col_hi);
                }
            }
            Shape::Polygon(points) => {
                let mut crossings: Vec<f64> = Vec::with_capacity(8);
                for row in row_lo..row_hi {
                    let yc = row as f64 + 0.5;
                    crossings.clear();
                    for (i, p) in points.iter().enumerate() {
                        let q = points[(i + 1) % points.len()];
                        if (p.y <= yc && yc < q.y) || (q.y <= yc && yc < p.y) {
                            crossings.push(p.x + (yc - p.y) * (q.x - p.x) / (q.y - p.y));
                        }
                    }
                    crossings.sort_by(|a, b| a.total_cmp(b));
                    for pair in crossings.chunks_exact(2) {
                        let x0 = pixel_index(pair[0]).max(col_lo);
                        let x1 = pixel_index(pair[1]).min(col_hi);
                        if x1 > x0 {
                            f(self, row, x0, x1);
                        }
                    }
                }
            }
            Shape::Ellipse { center, rx, ry, rotation } => {
                if *rx <= 0.0 || *ry <= 0.0 {
                    return;
                }
                let (sin, cos) = rotation.sin_cos();
                for row in row_lo..row_hi {
                    let dy = row as f64 + 0.5 - center.y;
                    let mut run: Option<usize> = None;
                    for col in col_lo..=col_hi {
                        let inside = col < col_hi && {
                            let dx = col as f64 + 0.5 - center.x;
                            let lx = dx * cos + dy * sin;
                            let ly = -dx * sin + dy * cos;
                            (lx / rx).powi(2) + (ly / ry).powi(2) <= 1.0
                        };
                        match (inside, run) {
                            (true, None) => run = Some(col),
                            (false, Some(start)) => {
                                f(self, row, start, col);
                                run = None;
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
    }

    fn blend(&mut self, x: usize, y: usize, src: Rgba) {
        let state = &self.state;
        let sa = src.a * state.alpha;
        if sa <= 0.0 || x >= self.width || y >= self.height {
            return;
        }
        let bright = state.brightness;
        let s = [
            (src.rgb.r as f64 * bright).min(255.0),
            (src.rgb.g as f64 * bright).min(255.0),
            (src.rgb.b as f64 * bright).min(255.0),
        ];
        let o = (y * self.width + x) * 4;
        let d = [self.pixels[o] as f64, self.pixels[o + 1] as f64, self.pixels[o + 2] as f64];
        let da = self.pixels[o + 3] as f64 / 255.0;

        let (out, out_a) = match state.composite {
            Composite::SourceOver => {
                let out_a = sa + da * (1.0 - sa);
                let mut out = [0.0; 3];
                if out_a > 0.0 {
                    for i in 0..3 {
                        out[i] = (s[i] * sa + d[i] * da * (1.0 - sa)) / out_a;
                    }
                }
                (out, out_a)
            }
            Composite::Lighter => {
                let mut out = [0.0; 3];
                for i in 0..3 {
                    out[i] = (d[i] + s[i] * sa).min(255.0);
                }
                (out, (da + sa).min(1.0))
            }
            Composite::Screen => {
                let mut out = [0.0; 3];
                for i in 0..3 {
                    let sp = s[i] * sa;
                    out[i] = d[i] + sp - d[i] * sp / 255.0;
                }
                (out, sa + da * (1.0 - sa))
            }
        };

        self.pixels[o] = out[0].round().clamp(0.0, 255.0) as u8;
        self.pixels[o + 1] = out[1].round().clamp(0.0, 255.0) as u8;
        self.pixels[o + 2] = out[2].round().clamp(0.0, 255.0) as u8;
        self.pixels[o + 3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// First pixel index whose center lies at or beyond `edge`
fn pixel_index(edge: f64) -> usize {
    (edge - 0.5).ceil().max(0.0) as usize
}

/// Quad covering a segment of the given width, wound consistently
fn line_quad(from: Point, to: Point, width: f64) -> Shape {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = dx.hypot(dy);
    let half = width / 2.0;
    let (nx, ny) = if len < f64::EPSILON {
        (half, 0.0)
    } else {
        (-dy / len * half, dx / len * half)
    };
    let mut quad = vec![
        Point::new(from.x + nx, from.y + ny),
        Point::new(to.x + nx, to.y + ny),
        Point::new(to.x - nx, to.y - ny),
        Point::new(from.x - nx, from.y - ny),
    ];
    // Degenerate segments collapse to a square dot
    if len < f64::EPSILON {
        quad = vec![
            Point::new(from.x - half, from.y - half),
            Point::new(from.x + half, from.y - half),
            Point::new(from.x + half, from.y + half),
            Point::new(from.x - half, from.y + half),
        ];
    }
    let winding = edge_function(
        &[quad[0].x, quad[0].y],
        &[quad[1].x, quad[1].y],
        &[quad[2].x, quad[2].y],
    );
    if winding < 0.0 {
        quad.reverse();
    }
    Shape::Polygon(quad)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::hex(0xff0000);

    fn opaque(canvas: &mut Canvas, color: Rgb) {
        let (w, h) = (canvas.width() as f64, canvas.height() as f64);
        canvas.fill_rect(0.0, 0.0, w, h, color);
    }

    #[test]
    fn test_fill_rect_covers_pixel_centers() {
        let mut canvas = Canvas::new(8, 8);
        canvas.fill_rect(2.0, 2.0, 3.0, 2.0, RED);
        assert_eq!(canvas.pixel(2, 2), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(4, 3), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(5, 3), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(2, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn test_polygon_fill() {
        let mut canvas = Canvas::new(10, 10);
        let triangle = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 10.0)];
        canvas.fill_polygon(&triangle, &Paint::from(RED));
        assert_eq!(canvas.pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(9, 9), [0, 0, 0, 0]);
    }

    #[test]
    fn test_alpha_blends_over_background() {
        let mut canvas = Canvas::new(4, 4);
        opaque(&mut canvas, Rgb::BLACK);
        canvas.set_alpha(0.5);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, Rgb::WHITE);
        let [r, g, b, a] = canvas.pixel(1, 1);
        assert_eq!((r, g, b, a), (128, 128, 128, 255));
    }

    #[test]
    fn test_lighter_is_additive() {
        let mut canvas = Canvas::new(2, 2);
        opaque(&mut canvas, Rgb::new(100, 0, 0));
        canvas.set_composite(Composite::Lighter);
        canvas.fill_rect(0.0, 0.0, 2.0, 2.0, Rgb::new(100, 50, 0));
        assert_eq!(canvas.pixel(0, 0), [200, 50, 0, 255]);
    }

    #[test]
    fn test_scoped_restores_state() {
        let mut canvas = Canvas::new(2, 2);
        canvas.scoped(|c| {
            c.set_shadow(12.0, RED.opaque());
            c.set_alpha(0.2);
            c.save();
            c.set_brightness(0.0);
        });
        assert_eq!(*canvas.state(), DrawState::default());
    }

    #[test]
    fn test_shadow_paints_outside_shape() {
        let mut canvas = Canvas::new(20, 20);
        canvas.set_shadow(6.0, RED.opaque());
        canvas.fill_rect(8.0, 8.0, 4.0, 4.0, Rgb::WHITE);
        assert_eq!(canvas.pixel(9, 9), [255, 255, 255, 255]);
        assert!(canvas.pixel(6, 9)[3] > 0, "halo expected left of the rect");
        assert_eq!(canvas.pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_radial_gradient() {
        let mut canvas = Canvas::new(21, 21);
        let paint = Paint::Radial {
            center: Point::new(10.5, 10.5),
            radius: 10.0,
            gradient: Gradient::new([(0.0, Rgb::WHITE.opaque()), (1.0, Rgb::BLACK.opaque())]),
        };
        canvas.fill_circle(Point::new(10.5, 10.5), 10.0, &paint);
        assert_eq!(canvas.pixel(10, 10), [255, 255, 255, 255]);
        let edge = canvas.pixel(10, 1);
        assert!(edge[0] < 60);
    }

    #[test]
    fn test_clip_limits_drawing() {
        let mut canvas = Canvas::new(10, 10);
        canvas.set_clip(Some(Rect::new(0.0, 5.0, 10.0, 5.0)));
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0, RED);
        canvas.stroke_line(
            Point::new(0.0, 0.0),
            Point::new(9.0, 9.0),
            1.0,
            Stroke::Solid(RED.opaque()),
        );
        assert_eq!(canvas.pixel(3, 3), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(3, 7), [255, 0, 0, 255]);
    }

    #[test]
    fn test_wide_line_has_width() {
        let mut canvas = Canvas::new(20, 20);
        canvas.stroke_line(
            Point::new(2.0, 10.0),
            Point::new(18.0, 10.0),
            4.0,
            Stroke::Solid(RED.opaque()),
        );
        assert_eq!(canvas.pixel(10, 8)[0], 255);
        assert_eq!(canvas.pixel(10, 11)[0], 255);
        assert_eq!(canvas.pixel(10, 14)[3], 0);
    }

    #[test]
    fn test_gradient_stops() {
        let g = Gradient::new([
            (1.0, Rgb::WHITE.opaque()),
            (0.0, Rgb::BLACK.opaque()),
        ]);
        assert_eq!(g.at(0.0).rgb, Rgb::BLACK);
        assert_eq!(g.at(1.0).rgb, Rgb::WHITE);
        assert_eq!(g.at(0.5).rgb, Rgb::new(128, 128, 128));
    }
}
