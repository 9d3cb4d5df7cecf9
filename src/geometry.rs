//! Provides cuboid geometry for block-model elements.
//!
//! Element coordinates are in block-local units where one block spans
//! 0–16 on each axis.
//!
//! # Examples
//! ```
//! use glimpse_items::geometry::compute_cube_vertices;
//!
//! let verts = compute_cube_vertices([0.0, 0.0, 0.0], [16.0, 16.0, 16.0]);
//! assert_eq!(verts[6], [16.0, 16.0, 16.0]);
//! ```

/// A 3D point in block-local units.
pub type Vec3 = [f32; 3];
/// A texture coordinate in 0–16 face space.
pub type Uv = [f32; 2];

/// Edge length of one block in element units.
pub const BLOCK_SIZE: f32 = 16.0;

/// The UV rectangle a face uses when it declares none.
pub const DEFAULT_UV: [f32; 4] = [0.0, 0.0, 16.0, 16.0];

/// Cube face directions.
///
/// # Examples
/// ```
/// use glimpse_items::geometry::FaceDirection;
///
/// assert_eq!(FaceDirection::North.name(), "north");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceDirection {
    North, // -Z
    South, // +Z
    East,  // +X
    West,  // -X
    Up,    // +Y
    Down,  // -Y
}

impl FaceDirection {
    pub const ALL: [FaceDirection; 6] = [
        FaceDirection::North,
        FaceDirection::South,
        FaceDirection::East,
        FaceDirection::West,
        FaceDirection::Up,
        FaceDirection::Down,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FaceDirection::North => "north",
            FaceDirection::South => "south",
            FaceDirection::East => "east",
            FaceDirection::West => "west",
            FaceDirection::Up => "up",
            FaceDirection::Down => "down",
        }
    }

    /// Indices into [`compute_cube_vertices`] for this face, ordered so they
    /// pair with the UV corners `(u1,v1) (u2,v1) (u2,v2) (u1,v2)`: the first
    /// corner is the top-left of the texture as seen from outside the face.
    pub fn corner_indices(&self) -> [usize; 4] {
        match self {
            FaceDirection::North => [2, 3, 0, 1],
            FaceDirection::South => [7, 6, 5, 4],
            FaceDirection::East => [6, 2, 1, 5],
            FaceDirection::West => [3, 7, 4, 0],
            FaceDirection::Up => [3, 2, 6, 7],
            FaceDirection::Down => [4, 5, 1, 0],
        }
    }
}

/// Computes the 8 vertices of an axis-aligned cube.
///
/// ```text
///     3-------2      Y+
///    /|      /|      |
///   7-------6 |      |
///   | |     | |      +--- X+
///   | 0-----|-1     /
///   |/      |/     Z+
///   4-------5
/// ```
pub fn compute_cube_vertices(from: Vec3, to: Vec3) -> [Vec3; 8] {
    [
        [from[0], from[1], from[2]], // 0: min corner
        [to[0], from[1], from[2]],   // 1: +X
        [to[0], to[1], from[2]],     // 2: +X +Y
        [from[0], to[1], from[2]],   // 3: +Y
        [from[0], from[1], to[2]],   // 4: +Z
        [to[0], from[1], to[2]],     // 5: +X +Z
        [to[0], to[1], to[2]],       // 6: max corner
        [from[0], to[1], to[2]],     // 7: +Y +Z
    ]
}

/// Builds the four textured corners of one face of the box `from..to`.
///
/// # Examples
/// ```
/// use glimpse_items::geometry::{face_quad, FaceDirection, DEFAULT_UV};
///
/// let quad = face_quad([0.0; 3], [16.0; 3], FaceDirection::Up, DEFAULT_UV);
/// assert_eq!(quad[0], ([0.0, 16.0, 0.0], [0.0, 0.0]));
/// ```
pub fn face_quad(from: Vec3, to: Vec3, direction: FaceDirection, uv: [f32; 4]) -> [(Vec3, Uv); 4] {
    let vertices = compute_cube_vertices(from, to);
    let [u1, v1, u2, v2] = uv;
    let uvs = [[u1, v1], [u2, v1], [u2, v2], [u1, v2]];
    let indices = direction.corner_indices();
    [
        (vertices[indices[0]], uvs[0]),
        (vertices[indices[1]], uvs[1]),
        (vertices[indices[2]], uvs[2]),
        (vertices[indices[3]], uvs[3]),
    ]
}
