/// Artifact vertex after rotation and perspective projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedVertex {
    /// Rotated object-space position (z grows away from the viewer)
    pub position: [f64; 3],
    pub screen_position: [f64; 2],
    /// Perspective factor `fov / (fov + z)`
    pub scale: f64,
}

impl ProjectedVertex {
    pub fn depth(&self) -> f64 {
        self.position[2]
    }
}
