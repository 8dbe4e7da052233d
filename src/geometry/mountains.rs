use crate::color::Rgb;
use crate::geometry::Viewport;
use crate::math::Point;

/// Deepest shadow to highlight
pub const PALETTE: [Rgb; 5] = [
    Rgb::hex(0x050508),
    Rgb::hex(0x0a0a10),
    Rgb::hex(0x151520),
    Rgb::hex(0x202030),
    Rgb::hex(0x2a2a40),
];

const SHADOW_DEEP: Rgb = PALETTE[0];
const SHADOW_SOFT: Rgb = PALETTE[1];
const MID_TONE: Rgb = PALETTE[2];
const LIGHT_WARM: Rgb = PALETTE[3];
const HIGHLIGHT: Rgb = PALETTE[4];

pub const FACETS_PER_VOLCANO: usize = 8;

/// One flat-colored polygon of the mountain silhouette
#[derive(Clone, Debug, PartialEq)]
pub struct Facet {
    pub points: Vec<Point>,
    pub color: Rgb,
}

impl Facet {
    fn new(points: [Point; 3], color: Rgb) -> Self {
        Facet {
            points: points.to_vec(),
            color,
        }
    }
}

/// Volcano outline: base corners plus a flat-topped peak
#[derive(Clone, Copy, Debug)]
pub struct VolcanoShape {
    pub start: Point,
    pub peak_start_x: f64,
    pub peak_end_x: f64,
    pub peak_y: f64,
    pub end: Point,
}

impl VolcanoShape {
    /// The six ridge control points, left base to right base
    pub fn ridges(&self) -> [Point; 6] {
        let (start, end) = (self.start, self.end);
        [
            start,
            Point::new(
                start.x + (self.peak_start_x - start.x) * 0.4,
                start.y - (start.y - self.peak_y) * 0.3,
            ),
            Point::new(self.peak_start_x, self.peak_y),
            Point::new(self.peak_end_x, self.peak_y),
            Point::new(
                end.x - (end.x - self.peak_end_x) * 0.4,
                start.y - (start.y - self.peak_y) * 0.4,
            ),
            end,
        ]
    }

    /// Eight facets in paint order. `width` is the viewport width, which sets
    /// the spread of the slope feet.
    pub fn facets(&self, width: f64) -> Vec<Facet> {
        let r = self.ridges();
        let base_y = self.start.y;
        let outer_foot = Point::new(r[1].x - width * 0.05, base_y);
        let inner_foot = Point::new(r[1].x + width * 0.08, base_y);
        let base_center = Point::new((self.start.x + self.end.x) / 2.0, base_y);
        let right_foot = Point::new(base_center.x + width * 0.1, base_y);

        vec![
            // left slope, outer then inner
            Facet::new([self.start, r[1], outer_foot], SHADOW_DEEP),
            Facet::new([r[1], r[2], inner_foot], SHADOW_SOFT),
            Facet::new([r[1], inner_foot, outer_foot], SHADOW_DEEP),
            // central faces
            Facet::new([r[2], r[3], base_center], MID_TONE),
            Facet::new([r[2], base_center, inner_foot], SHADOW_SOFT),
            // right slope
            Facet::new([r[3], r[4], base_center], LIGHT_WARM),
            Facet::new([r[4], self.end, right_foot], HIGHLIGHT),
            Facet::new([r[4], right_foot, base_center], LIGHT_WARM),
        ]
    }
}

/// The three volcanoes, as fractions of the viewport
fn volcano_shapes(viewport: Viewport, horizon: f64) -> [VolcanoShape; 3] {
    let (w, h) = (viewport.w(), viewport.h());
    let shape = |start: f64, peak_start: f64, peak_end: f64, rise: f64, end: f64| VolcanoShape {
        start: Point::new(w * start, horizon),
        peak_start_x: w * peak_start,
        peak_end_x: w * peak_end,
        peak_y: horizon - h * rise,
        end: Point::new(w * end, horizon),
    };
    [
        shape(-0.05, 0.10, 0.13, 0.25, 0.25),
        shape(0.15, 0.42, 0.48, 0.45, 0.75),
        shape(0.65, 0.72, 0.75, 0.20, 0.85),
    ]
}

/// Mountain silhouette shared by every scene kind: 3 volcanoes x 8 facets.
/// Deterministic for a given viewport and horizon.
pub fn mountain_range(viewport: Viewport, horizon: f64) -> Vec<Facet> {
    volcano_shapes(viewport, horizon)
        .iter()
        .flat_map(|volcano| volcano.facets(viewport.w()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SceneKind;

    #[test]
    fn test_facet_count() {
        for (w, h) in [(1, 1), (320, 568), (1024, 768), (1920, 1080), (4000, 300)] {
            let vp = Viewport::new(w, h);
            for kind in SceneKind::ALL {
                let facets = mountain_range(vp, kind.horizon(vp));
                assert_eq!(facets.len(), 3 * FACETS_PER_VOLCANO);
                for facet in &facets {
                    assert!(facet.points.len() >= 3);
                    assert!(facet.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let vp = Viewport::new(1366, 768);
        assert_eq!(mountain_range(vp, 600.0), mountain_range(vp, 600.0));
    }

    #[test]
    fn test_facets_stay_above_horizon() {
        let vp = Viewport::new(1200, 800);
        let horizon = SceneKind::Urban.horizon(vp);
        for facet in mountain_range(vp, horizon) {
            assert!(facet.points.iter().all(|p| p.y <= horizon + 1e-9));
        }
    }

    #[test]
    fn test_palette_roles_in_order() {
        let facets = mountain_range(Viewport::new(800, 600), 500.0);
        let first: Vec<Rgb> = facets[..8].iter().map(|f| f.color).collect();
        assert_eq!(
            first,
            vec![
                SHADOW_DEEP,
                SHADOW_SOFT,
                SHADOW_DEEP,
                MID_TONE,
                SHADOW_SOFT,
                LIGHT_WARM,
                HIGHLIGHT,
                LIGHT_WARM,
            ]
        );
    }

    #[test]
    fn test_peak_height() {
        let vp = Viewport::new(1000, 1000);
        let shapes = volcano_shapes(vp, 820.0);
        let ridges = shapes[1].ridges();
        assert!((ridges[2].y - (820.0 - 450.0)).abs() < 1e-9);
        assert!((ridges[1].x - (150.0 + (420.0 - 150.0) * 0.4)).abs() < 1e-9);
    }
}
