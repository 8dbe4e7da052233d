use std::f64::consts::{PI, TAU};
use std::time::Instant;

use tracing::debug;

use crate::color::{Rgb, Rgba};
use crate::geometry::Viewport;
use crate::graphics::{Canvas, Gradient, Paint, Stroke};
use crate::math::{multiply_matrices, multiply_matrix_vector, rotation_x, rotation_y, Point};
use crate::state::MenuState;
use crate::vertex::ProjectedVertex;

/// Octahedron: top, right, front, left, back, bottom
pub const VERTICES: [[f64; 3]; 6] = [
    [0.0, -1.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [-1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 1.0, 0.0],
];

pub const EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [0, 2],
    [0, 3],
    [0, 4],
    [1, 2],
    [2, 3],
    [3, 4],
    [4, 1],
    [5, 1],
    [5, 2],
    [5, 3],
    [5, 4],
];

/// Perspective distance
pub const FOV: f64 = 4.0;
/// Scroll progress past which an open menu snaps shut
pub const FORCE_CLOSE_SCROLL: f64 = 0.01;
/// Scroll progress past which the artifact ignores input and is not drawn
pub const INERT_SCROLL: f64 = 0.5;

const BASE_HIT_RADIUS: f64 = 160.0;
const COMPACT_HIT_RADIUS: f64 = 200.0;
/// Viewports whose shorter side is at most this get the larger radius
const COMPACT_MIN_SIDE: f64 = 900.0;
const OPEN_HIT_FACTOR: f64 = 2.5;

const CLOSED_COLOR: Rgb = Rgb::hex(0x00aaff);
const OPEN_COLOR: Rgb = Rgb::hex(0x00ffcc);
const CORE_COLOR: Rgb = Rgb::hex(0xffd700);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Touch,
    /// May be synthesized right after a touch
    Click,
    Pointer,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub kind: PointerKind,
    /// The event landed on a navigation link
    pub on_nav_link: bool,
    pub at: Instant,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, kind: PointerKind, at: Instant) -> Self {
        PointerEvent {
            position: Point::new(x, y),
            kind,
            on_nav_link: false,
            at,
        }
    }
}

/// Glow the landscape borrows from the artifact
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuLight {
    pub color: Rgb,
    pub intensity: f64,
}

impl MenuLight {
    pub fn from_expansion(expansion: f64) -> Self {
        let e = expansion.clamp(0.0, 1.0);
        MenuLight {
            color: CLOSED_COLOR.lerp(OPEN_COLOR, e),
            intensity: 0.5 + 0.5 * e,
        }
    }

    pub fn shadow(&self) -> Rgba {
        self.color.with_alpha(self.intensity)
    }
}

/// Rotating octahedron that opens and closes the navigation menu
pub struct ArtifactController {
    state: MenuState,
    viewport: Viewport,
}

impl ArtifactController {
    pub fn new(viewport: Viewport) -> Self {
        ArtifactController {
            state: MenuState::default(),
            viewport,
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    pub fn expansion(&self) -> f64 {
        self.state.expansion
    }

    pub fn target_expansion(&self) -> f64 {
        self.state.target_expansion
    }

    pub fn menu_light(&self) -> MenuLight {
        MenuLight::from_expansion(self.state.expansion)
    }

    /// Activation radius around the viewport center
    pub fn hit_radius(&self) -> f64 {
        let base = if self.viewport.min_side() <= COMPACT_MIN_SIDE {
            COMPACT_HIT_RADIUS
        } else {
            BASE_HIT_RADIUS
        };
        if self.state.is_open {
            base * OPEN_HIT_FACTOR
        } else {
            base
        }
    }

    /// Toggles the menu for a qualifying pointer event. Returns whether it toggled.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        if event.on_nav_link || self.state.scroll > INERT_SCROLL {
            return false;
        }
        let (x, y) = (event.position.x, event.position.y);
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        if event.position.distance(self.viewport.center()) >= self.hit_radius() {
            return false;
        }
        let toggled = self.state.toggle(event.at);
        if toggled {
            debug!(open = self.state.is_open, kind = ?event.kind, "artifact toggled");
        }
        toggled
    }

    fn base_size(&self) -> f64 {
        self.viewport.min_side() * 0.14
    }

    /// Projects every vertex through the current rotation and perspective
    pub fn project(&self) -> [ProjectedVertex; 6] {
        let scale = self.base_size() * (0.8 + self.state.expansion * 0.4);
        let time = self.state.time;
        let rotation = multiply_matrices(&rotation_x(time * 0.5), &rotation_y(time * 0.8));
        let center = self.viewport.center();
        VERTICES.map(|v| {
            let position = multiply_matrix_vector(&rotation, &v);
            let perspective = FOV / (FOV + position[2]);
            ProjectedVertex {
                position,
                screen_position: [
                    position[0] * perspective * scale + center.x,
                    position[1] * perspective * scale + center.y,
                ],
                scale: perspective,
            }
        })
    }

    /// Advances time and easing, then draws. Call once per frame.
    pub fn render(&mut self, canvas: &mut Canvas, scroll: f64) {
        self.state.scroll = scroll;
        if self.state.is_open && scroll > FORCE_CLOSE_SCROLL {
            self.state.set_open(false);
            debug!(scroll, "artifact force-closed by scroll");
        }
        if scroll > INERT_SCROLL {
            return;
        }

        let speed = if self.state.is_open { 0.3 } else { 1.0 };
        self.state.time += 0.01 * speed;
        self.state.ease();

        let alpha = (1.0 - scroll * 2.0).max(0.0);
        canvas.scoped(|c| {
            c.set_alpha(alpha);
            self.draw(c);
        });
    }

    fn draw(&self, canvas: &mut Canvas) {
        let base = self.base_size();
        let center = self.viewport.center();
        let open = self.state.is_open;
        let primary = if open { OPEN_COLOR } else { CLOSED_COLOR };
        let time = self.state.time;

        // Backdrop glow
        let backdrop = Gradient::new([
            (0.0, Rgb::new(0, 20, 40).with_alpha(0.8)),
            (0.5, Rgba::TRANSPARENT),
        ]);
        canvas.fill_circle(
            center,
            base * 0.5,
            &Paint::Radial {
                center,
                radius: base * 1.5,
                gradient: backdrop,
            },
        );

        let projected = self.project();
        let (back, front) = partition_edges(&projected);
        let edge_glow = if open { 15.0 } else { 5.0 };

        self.draw_edges(canvas, &projected, &back, primary, edge_glow);

        // Core occludes the back edges only
        let pulse = 1.0 + (time * 5.0).sin() * 0.2;
        let core = base * 0.15 * pulse;
        canvas.scoped(|c| {
            c.set_shadow(20.0, CORE_COLOR.opaque());
            c.fill_polygon(
                &[
                    center.offset(0.0, -core),
                    center.offset(core, 0.0),
                    center.offset(0.0, core),
                    center.offset(-core, 0.0),
                ],
                &Paint::from(CORE_COLOR),
            );
        });

        self.draw_edges(canvas, &projected, &front, primary, edge_glow);

        for p in &projected {
            let at = Point::new(p.screen_position[0], p.screen_position[1]);
            let node = 4.0 * p.scale;
            canvas.scoped(|c| {
                c.set_shadow(10.0, Rgb::WHITE.opaque());
                c.fill_circle(at, node, &Paint::from(Rgb::WHITE));
                c.clear_shadow();
                c.stroke_polyline(&circle_points(at, node * 1.5, 16), 1.0, CORE_COLOR.opaque());
            });
        }

        let hud = base * 1.4 + self.state.expansion * 30.0;
        canvas.scoped(|c| {
            c.set_shadow(5.0, primary.opaque());
            let spin = time * 0.1;
            hud_arc(c, center, hud, spin, spin + PI * 0.8, primary);
            hud_arc(c, center, hud, spin + PI, spin + PI * 1.8, primary);
            c.stroke_polyline(
                &circle_points(center, hud + 10.0, 64),
                1.0,
                Rgb::WHITE.with_alpha(0.2),
            );
        });
    }

    fn draw_edges(
        &self,
        canvas: &mut Canvas,
        projected: &[ProjectedVertex; 6],
        edges: &[[usize; 2]],
        primary: Rgb,
        glow: f64,
    ) {
        canvas.scoped(|c| {
            c.set_shadow(glow, primary.opaque());
            for &[a, b] in edges {
                let (pa, pb) = (&projected[a], &projected[b]);
                c.stroke_line(
                    Point::new(pa.screen_position[0], pa.screen_position[1]),
                    Point::new(pb.screen_position[0], pb.screen_position[1]),
                    2.0,
                    Stroke::Gradient(primary.opaque(), Rgb::WHITE.with_alpha(0.5)),
                );
            }
        });
    }
}

/// Splits edges into those behind the center plane (average depth > 0) and
/// those in front, each in their original order
pub fn partition_edges(projected: &[ProjectedVertex; 6]) -> (Vec<[usize; 2]>, Vec<[usize; 2]>) {
    EDGES
        .iter()
        .copied()
        .partition(|[a, b]| (projected[*a].depth() + projected[*b].depth()) / 2.0 > 0.0)
}

fn circle_points(center: Point, radius: f64, segments: usize) -> Vec<Point> {
    (0..=segments)
        .map(|i| {
            let a = TAU * i as f64 / segments as f64;
            Point::new(center.x + a.cos() * radius, center.y + a.sin() * radius)
        })
        .collect()
}

/// Segmented glyph ring between two angles: plain dashes alternating with
/// raised notches, plus a dot under every odd segment
fn hud_arc(canvas: &mut Canvas, center: Point, radius: f64, start: f64, end: f64, color: Rgb) {
    const SEGMENTS: usize = 20;
    let step = (end - start) / SEGMENTS as f64;
    let at =
        |angle: f64, r: f64| Point::new(center.x + angle.cos() * r, center.y + angle.sin() * r);
    let stroke = color.opaque();
    let high = radius + 6.0;

    for i in 0..SEGMENTS {
        let a1 = start + i as f64 * step;
        let a2 = a1 + step * 0.7;
        match i % 4 {
            0 | 3 => canvas.stroke_line(at(a1, radius), at(a2, radius), 2.0, Stroke::Solid(stroke)),
            _ => canvas.stroke_polyline(
                &[at(a1, radius), at(a1, high), at(a2, high), at(a2, radius)],
                2.0,
                stroke,
            ),
        }
    }
    for i in (1..SEGMENTS).step_by(2) {
        let a = start + i as f64 * step + step * 0.35;
        canvas.fill_circle(at(a, radius - 5.0), 1.5, &Paint::from(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TOGGLE_DEBOUNCE;
    use std::time::Duration;

    fn click(x: f64, y: f64, at: Instant) -> PointerEvent {
        PointerEvent::new(x, y, PointerKind::Click, at)
    }

    #[test]
    fn test_center_click_toggles() {
        let mut artifact = ArtifactController::new(Viewport::new(1200, 800));
        let t0 = Instant::now();
        assert!(artifact.handle_pointer(&click(600.0, 400.0, t0)));
        assert!(artifact.is_open());
        assert_eq!(artifact.target_expansion(), 1.0);
        assert!(artifact.handle_pointer(&click(600.0, 400.0, t0 + TOGGLE_DEBOUNCE)));
        assert!(!artifact.is_open());
        assert_eq!(artifact.target_expansion(), 0.0);
    }

    #[test]
    fn test_outside_click_ignored() {
        let mut artifact = ArtifactController::new(Viewport::new(1200, 800));
        assert_eq!(artifact.hit_radius(), 200.0);
        assert!(!artifact.handle_pointer(&click(600.0 + 200.0, 400.0, Instant::now())));
        assert!(!artifact.handle_pointer(&click(5.0, 5.0, Instant::now())));
        assert!(!artifact.is_open());
    }

    #[test]
    fn test_radius_by_size_and_state() {
        let mut artifact = ArtifactController::new(Viewport::new(1920, 1080));
        assert_eq!(artifact.hit_radius(), 160.0);
        artifact.handle_pointer(&click(960.0, 540.0, Instant::now()));
        assert_eq!(artifact.hit_radius(), 400.0);
    }

    #[test]
    fn test_touch_then_synthesized_click_counts_once() {
        let mut artifact = ArtifactController::new(Viewport::new(1200, 800));
        let t0 = Instant::now();
        let touch = PointerEvent::new(610.0, 390.0, PointerKind::Touch, t0);
        assert!(artifact.handle_pointer(&touch));
        let ghost = click(610.0, 390.0, t0 + Duration::from_millis(40));
        assert!(!artifact.handle_pointer(&ghost));
        assert!(artifact.is_open());
    }

    #[test]
    fn test_nav_link_and_scroll_make_it_inert() {
        let mut artifact = ArtifactController::new(Viewport::new(1200, 800));
        let mut event = click(600.0, 400.0, Instant::now());
        event.on_nav_link = true;
        assert!(!artifact.handle_pointer(&event));

        let mut canvas = Canvas::new(120, 80);
        artifact.render(&mut canvas, 0.6);
        assert!(!artifact.handle_pointer(&click(600.0, 400.0, Instant::now())));
        assert!(!artifact.is_open());
    }

    #[test]
    fn test_scroll_forces_close() {
        let mut artifact = ArtifactController::new(Viewport::new(1200, 800));
        artifact.handle_pointer(&click(600.0, 400.0, Instant::now()));
        let mut canvas = Canvas::new(1200, 800);
        artifact.render(&mut canvas, 0.0);
        assert!(artifact.is_open());
        artifact.render(&mut canvas, 0.02);
        assert!(!artifact.is_open());
        assert_eq!(artifact.target_expansion(), 0.0);
    }

    #[test]
    fn test_projection_at_rest() {
        let artifact = ArtifactController::new(Viewport::new(1000, 1000));
        let projected = artifact.project();
        // time 0: no rotation, the front vertex sits on the center
        let front = projected[2];
        assert!((front.scale - 0.8).abs() < 1e-12);
        assert!((front.screen_position[0] - 500.0).abs() < 1e-9);
        let right = projected[1];
        assert!((right.screen_position[0] - (500.0 + 140.0 * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_edges_partition_covers_all() {
        let mut artifact = ArtifactController::new(Viewport::new(800, 600));
        let mut canvas = Canvas::new(800, 600);
        for _ in 0..37 {
            artifact.render(&mut canvas, 0.0);
        }
        let (back, front) = partition_edges(&artifact.project());
        assert_eq!(back.len() + front.len(), EDGES.len());
        assert!(!front.is_empty());
    }

    #[test]
    fn test_menu_light_follows_expansion() {
        assert_eq!(MenuLight::from_expansion(0.0).color, CLOSED_COLOR);
        assert_eq!(MenuLight::from_expansion(1.0).color, OPEN_COLOR);
        assert_eq!(MenuLight::from_expansion(1.0).intensity, 1.0);
        assert_eq!(MenuLight::from_expansion(0.0).intensity, 0.5);
    }

    #[test]
    fn test_render_restores_state() {
        let mut artifact = ArtifactController::new(Viewport::new(300, 200));
        let mut canvas = Canvas::new(300, 200);
        artifact.render(&mut canvas, 0.1);
        assert_eq!(*canvas.state(), crate::graphics::DrawState::default());
        assert!(canvas.pixel(150, 100)[3] > 0);
        assert_eq!(canvas.pixel(0, 0)[3], 0);
    }
}
