//! Procedural scene populations.
//!
//! Every generator works in absolute pixels of the current [`Viewport`] and is
//! re-run in full on resize and when asset loading settles.

pub mod ceremonial;
pub mod mountains;
pub mod rural;
pub mod urban;

use std::fmt;

use rand::Rng;

use crate::assets::{SceneAssets, Sprite};
use crate::color::Rgb;
use crate::math::Point;

pub use ceremonial::Ceremonial;
pub use mountains::Facet;
pub use rural::Village;
pub use urban::Skyline;

/// Viewports narrower than this use the mobile densities
pub const MOBILE_BREAKPOINT: u32 = 768;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Viewport { width, height }
    }

    pub fn w(&self) -> f64 {
        self.width as f64
    }

    pub fn h(&self) -> f64 {
        self.height as f64
    }

    pub fn is_mobile(&self) -> bool {
        self.width < MOBILE_BREAKPOINT
    }

    pub fn center(&self) -> Point {
        Point::new(self.w() / 2.0, self.h() / 2.0)
    }

    pub fn min_side(&self) -> f64 {
        self.w().min(self.h())
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Page kind, chosen once when the page pipeline is built
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum SceneKind {
    #[default]
    Urban,
    Rural,
    Ceremonial,
    Generic,
}

impl SceneKind {
    pub const ALL: [SceneKind; 4] = [
        SceneKind::Urban,
        SceneKind::Rural,
        SceneKind::Ceremonial,
        SceneKind::Generic,
    ];

    /// Horizon of the mountain range; rural sits higher to leave room for the lake
    pub fn horizon(self, viewport: Viewport) -> f64 {
        match self {
            SceneKind::Rural => viewport.h() * 0.70,
            _ => viewport.h() * 0.82,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Urban => "urban",
            SceneKind::Rural => "rural",
            SceneKind::Ceremonial => "ceremonial",
            SceneKind::Generic => "generic",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a generated structure is painted
#[derive(Clone, Debug, PartialEq)]
pub enum Appearance {
    Sprite(Sprite),
    /// Flat fallback rectangle
    Block(Rgb),
}

impl Appearance {
    pub fn is_block(&self) -> bool {
        matches!(self, Appearance::Block(_))
    }
}

/// Picks a random sprite, if any loaded
pub fn pick_sprite<'a, R: Rng>(sprites: &'a [Sprite], rng: &mut R) -> Option<&'a Sprite> {
    if sprites.is_empty() {
        None
    } else {
        Some(&sprites[rng.random_range(0..sprites.len())])
    }
}

/// Height and appearance for a structure of the given width: the sprite's own
/// aspect ratio when one is available, otherwise `fallback_ratio` and a flat block.
pub fn sized_structure<R: Rng>(
    width: f64,
    sprites: &[Sprite],
    fallback_ratio: f64,
    block: Rgb,
    rng: &mut R,
) -> (f64, Appearance) {
    match pick_sprite(sprites, rng) {
        Some(sprite) => (width * sprite.ratio(), Appearance::Sprite(sprite.clone())),
        None => (width * fallback_ratio, Appearance::Block(block)),
    }
}

/// Scene-specific populations
#[derive(Clone, Debug)]
pub enum Population {
    Urban(Skyline),
    Rural(Village),
    Ceremonial(Ceremonial),
    /// Flat dark ground only
    Generic,
}

/// Everything the landscape draws for one page
#[derive(Clone, Debug)]
pub struct SceneGeometry {
    pub kind: SceneKind,
    pub viewport: Viewport,
    pub mountains: Vec<Facet>,
    pub population: Population,
}

/// Generates the mountain range plus the population for `kind`
pub fn generate<R: Rng>(
    kind: SceneKind,
    viewport: Viewport,
    assets: &SceneAssets,
    rng: &mut R,
) -> SceneGeometry {
    let mountains = mountains::mountain_range(viewport, kind.horizon(viewport));
    let population = match kind {
        SceneKind::Urban => Population::Urban(urban::generate(viewport, assets, rng)),
        SceneKind::Rural => Population::Rural(rural::generate(viewport, assets, rng)),
        SceneKind::Ceremonial => {
            Population::Ceremonial(ceremonial::generate(viewport, assets, rng))
        }
        SceneKind::Generic => Population::Generic,
    };
    SceneGeometry {
        kind,
        viewport,
        mountains,
        population,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mobile_breakpoint() {
        assert!(Viewport::new(767, 900).is_mobile());
        assert!(!Viewport::new(768, 900).is_mobile());
    }

    #[test]
    fn test_horizon_by_kind() {
        let vp = Viewport::new(1000, 1000);
        assert!((SceneKind::Rural.horizon(vp) - 700.0).abs() < 1e-9);
        assert!((SceneKind::Urban.horizon(vp) - 820.0).abs() < 1e-9);
        assert!((SceneKind::Generic.horizon(vp) - 820.0).abs() < 1e-9);
    }

    #[test]
    fn test_generate_matches_kind() {
        let mut rng = StdRng::seed_from_u64(1);
        let assets = SceneAssets::default();
        for kind in SceneKind::ALL {
            let geometry = generate(kind, Viewport::new(1280, 720), &assets, &mut rng);
            assert_eq!(geometry.mountains.len(), 24);
            let matches = matches!(
                (kind, &geometry.population),
                (SceneKind::Urban, Population::Urban(_))
                    | (SceneKind::Rural, Population::Rural(_))
                    | (SceneKind::Ceremonial, Population::Ceremonial(_))
                    | (SceneKind::Generic, Population::Generic)
            );
            assert!(matches, "{kind} produced the wrong population");
        }
    }

    #[test]
    fn test_fallback_sizing_without_sprites() {
        let mut rng = StdRng::seed_from_u64(3);
        let (h, look) = sized_structure(20.0, &[], 1.5, Rgb::hex(0x080808), &mut rng);
        assert_eq!(h, 30.0);
        assert_eq!(look, Appearance::Block(Rgb::hex(0x080808)));
    }
}
