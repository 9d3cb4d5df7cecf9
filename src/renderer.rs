//! Provides a software rasterizer for block-model item sprites.
//!
//! Cuboid faces are projected with a fixed isometric transform, sorted
//! back to front, and drawn as textured triangles into a supersampled
//! straight-alpha buffer that is box-filtered down to the output size.
//! There is no depth buffer and no lighting.
//!
//! No GPU is required; it runs entirely on the CPU.
//!
//! # Examples
//! ```
//! use std::collections::HashMap;
//!
//! use glimpse_items::assets::ResolvedModel;
//! use glimpse_items::config::RenderConfig;
//! use glimpse_items::renderer;
//!
//! let empty = ResolvedModel::default();
//! assert!(renderer::render_model(&empty, &HashMap::new(), &RenderConfig::default()).is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;

use crate::assets::{AssetReference, CuboidElement, ElementFace, ResolvedModel};
use crate::codec::RgbaImage;
use crate::config::{RenderConfig, RenderView};
use crate::geometry::{compute_cube_vertices, face_quad, FaceDirection, Uv, Vec3, BLOCK_SIZE};

/// Vertical squash applied to the Y axis by the projection.
pub const VERTICAL_SCALE: f32 = 1.15;
/// Weight of height in the painter's depth key.
pub const DEPTH_HEIGHT_WEIGHT: f32 = 0.35;
/// Barycentric tolerance; slightly negative so shared triangle edges overlap.
pub const EDGE_EPSILON: f32 = 0.002;
/// Fraction of the sprite left empty on each side.
pub const FRAME_PADDING: f32 = 0.06;

const FRONT_FACES: [FaceDirection; 3] = [FaceDirection::Up, FaceDirection::East, FaceDirection::South];
const BACK_FACES: [FaceDirection; 3] = [FaceDirection::Up, FaceDirection::West, FaceDirection::North];

impl RenderView {
    /// Faces drawn for this view.
    pub fn visible_faces(&self) -> [FaceDirection; 3] {
        match self {
            RenderView::Front => FRONT_FACES,
            RenderView::Back => BACK_FACES,
        }
    }

    /// Maps a model-space point into the coordinates the projection sees.
    /// The back view mirrors X and Z instead of rotating a camera.
    pub fn view_point(&self, point: Vec3) -> Vec3 {
        match self {
            RenderView::Front => point,
            RenderView::Back => [BLOCK_SIZE - point[0], point[1], BLOCK_SIZE - point[2]],
        }
    }
}

/// Projects a block-local point onto the sprite plane.
///
/// # Examples
/// ```
/// use glimpse_items::config::RenderView;
/// use glimpse_items::renderer::project;
///
/// let p = project([16.0, 0.0, 0.0], RenderView::Front);
/// assert_eq!((p.x, p.y), (16.0, 8.0));
/// ```
pub fn project(point: Vec3, view: RenderView) -> Vec2 {
    let [x, y, z] = view.view_point(point);
    Vec2::new(x - z, (x + z) * 0.5 - y * VERTICAL_SCALE)
}

/// Projected bounds of a full block, used to frame every sprite the same way.
fn frame_bounds() -> (Vec2, Vec2) {
    let mut min = Vec2::splat(f32::INFINITY);
    let mut max = Vec2::splat(f32::NEG_INFINITY);
    for corner in compute_cube_vertices([0.0; 3], [BLOCK_SIZE; 3]) {
        let p = project(corner, RenderView::Front);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

/// Maps projected coordinates to pixels of a square buffer.
struct Framing {
    center: Vec2,
    scale: f32,
    half: f32,
}

impl Framing {
    fn new(size: u32) -> Self {
        let (min, max) = frame_bounds();
        let extent = max - min;
        let size = size as f32;
        Self {
            center: min.lerp(max, 0.5),
            scale: size * (1.0 - 2.0 * FRAME_PADDING) / extent.x.max(extent.y),
            half: size * 0.5,
        }
    }

    fn to_screen(&self, p: Vec2) -> Vec2 {
        (p - self.center) * self.scale + Vec2::splat(self.half)
    }
}

/// One face ready to draw.
struct FaceDraw<'a> {
    screen: [Vec2; 4],
    uvs: [Uv; 4],
    depth: f32,
    texture: &'a RgbaImage,
}

/// Every texture a model's visible faces reference, deduplicated.
///
/// Faces whose alias does not resolve are left out.
pub fn required_textures(model: &ResolvedModel, view: RenderView) -> Vec<AssetReference> {
    let mut out: Vec<AssetReference> = Vec::new();
    for element in &model.elements {
        for direction in view.visible_faces() {
            let Some(reference) = element.face(direction).and_then(|f| face_texture(model, f)) else {
                continue;
            };
            if !out.contains(&reference) {
                out.push(reference);
            }
        }
    }
    out
}

fn face_texture(model: &ResolvedModel, face: &ElementFace) -> Option<AssetReference> {
    match model.textures.resolve_value(&face.texture) {
        Ok(value) => Some(AssetReference::parse(&value)),
        Err(e) => {
            tracing::debug!("skipping {} face: {}", face.direction.name(), e);
            None
        }
    }
}

fn collect_faces<'a>(
    model: &ResolvedModel,
    textures: &'a HashMap<AssetReference, Arc<RgbaImage>>,
    view: RenderView,
    framing: &Framing,
) -> Vec<FaceDraw<'a>> {
    let mut faces = Vec::new();
    for element in &model.elements {
        for direction in view.visible_faces() {
            if let Some(draw) = build_face(model, element, direction, textures, view, framing) {
                faces.push(draw);
            }
        }
    }
    faces.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    faces
}

fn build_face<'a>(
    model: &ResolvedModel,
    element: &CuboidElement,
    direction: FaceDirection,
    textures: &'a HashMap<AssetReference, Arc<RgbaImage>>,
    view: RenderView,
    framing: &Framing,
) -> Option<FaceDraw<'a>> {
    let face = element.face(direction)?;
    let texture = textures.get(&face_texture(model, face)?)?;
    if texture.width == 0 || texture.height == 0 {
        return None;
    }

    let quad = face_quad(element.from, element.to, direction, face.uv);
    let mut screen = [Vec2::ZERO; 4];
    let mut uvs = [[0.0; 2]; 4];
    let mut depth = 0.0;
    for (i, (point, uv)) in quad.into_iter().enumerate() {
        let [x, y, z] = view.view_point(point);
        depth += x + z + y * DEPTH_HEIGHT_WEIGHT;
        screen[i] = framing.to_screen(project(point, view));
        uvs[i] = uv;
    }

    Some(FaceDraw {
        screen,
        uvs,
        depth: depth / 4.0,
        texture,
    })
}

/// Renders a resolved model to an RGBA sprite of `config.output_size`.
///
/// `textures` maps each reference from [`required_textures`] to its decoded
/// image; faces whose texture is absent are skipped. Returns `None` if the
/// model has no elements or nothing visible was drawn.
pub fn render_model(
    model: &ResolvedModel,
    textures: &HashMap<AssetReference, Arc<RgbaImage>>,
    config: &RenderConfig,
) -> Option<RgbaImage> {
    if model.elements.is_empty() {
        return None;
    }

    let config = config.clone().normalized();
    let size = config.buffer_size();
    let framing = Framing::new(size);
    let faces = collect_faces(model, textures, config.view, &framing);
    if faces.is_empty() {
        return None;
    }

    // ---- Framebuffer ----
    let n = size as usize;
    let mut color_buf = vec![[0.0_f32; 4]; n * n];

    for face in &faces {
        for [a, b, c] in [[0, 1, 2], [0, 2, 3]] {
            rasterize_triangle(
                &mut color_buf,
                n,
                [face.screen[a], face.screen[b], face.screen[c]],
                [face.uvs[a], face.uvs[b], face.uvs[c]],
                face.texture,
            );
        }
    }

    if color_buf.iter().all(|px| px[3] <= 0.0) {
        return None;
    }

    Some(downsample(&color_buf, n, config.supersample as usize))
}

fn rasterize_triangle(
    color_buf: &mut [[f32; 4]],
    n: usize,
    screen: [Vec2; 3],
    uvs: [Uv; 3],
    texture: &RgbaImage,
) {
    // Screen-space bounding box
    let lo = screen[0].min(screen[1]).min(screen[2]).floor().max(Vec2::ZERO);
    let hi = screen[0].max(screen[1]).max(screen[2]).ceil();
    let min_x = lo.x as usize;
    let min_y = lo.y as usize;
    let max_x = (hi.x.max(0.0) as usize).min(n);
    let max_y = (hi.y.max(0.0) as usize).min(n);

    for y in min_y..max_y {
        for x in min_x..max_x {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let (u_bary, v_bary, w_bary) = barycentric(screen, p);
            if u_bary < -EDGE_EPSILON || v_bary < -EDGE_EPSILON || w_bary < -EDGE_EPSILON {
                continue;
            }

            let tex_u = u_bary * uvs[0][0] + v_bary * uvs[1][0] + w_bary * uvs[2][0];
            let tex_v = u_bary * uvs[0][1] + v_bary * uvs[1][1] + w_bary * uvs[2][1];
            let texel = sample_nearest(texture, tex_u, tex_v);
            if texel[3] == 0 {
                continue;
            }

            let src = texel.map(|c| c as f32 / 255.0);
            let dst = &mut color_buf[y * n + x];
            *dst = composite_over(src, *dst);
        }
    }
}

/// Nearest-neighbor lookup with `u`, `v` in 0–16 face space.
fn sample_nearest(texture: &RgbaImage, u: f32, v: f32) -> [u8; 4] {
    let tx = ((u / BLOCK_SIZE) * texture.width as f32).floor();
    let ty = ((v / BLOCK_SIZE) * texture.height as f32).floor();
    let tx = tx.clamp(0.0, (texture.width - 1) as f32) as u32;
    let ty = ty.clamp(0.0, (texture.height - 1) as f32) as u32;
    texture.pixel(tx, ty)
}

/// Straight-alpha "over".
fn composite_over(src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
    let sa = src[3];
    let da = dst[3] * (1.0 - sa);
    let out_a = sa + da;
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mix = |s: f32, d: f32| (s * sa + d * da) / out_a;
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), out_a]
}

/// Averages each `factor`×`factor` block of an `n`×`n` buffer.
fn downsample(color_buf: &[[f32; 4]], n: usize, factor: usize) -> RgbaImage {
    let out = n / factor;
    let mut image = RgbaImage::new(out as u32, out as u32);

    for oy in 0..out {
        for ox in 0..out {
            let mut sum = [0.0_f32; 4];
            let mut count = 0.0_f32;
            for sy in (oy * factor)..((oy + 1) * factor).min(n) {
                for sx in (ox * factor)..((ox + 1) * factor).min(n) {
                    let px = color_buf[sy * n + sx];
                    for c in 0..4 {
                        sum[c] += px[c];
                    }
                    count += 1.0;
                }
            }
            let i = (oy * out + ox) * 4;
            for c in 0..4 {
                image.pixels[i + c] = (sum[c] / count * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    image
}

// ===========================================================================
// Rasterization helpers
// ===========================================================================

fn barycentric(tri: [Vec2; 3], p: Vec2) -> (f32, f32, f32) {
    let v0 = tri[1] - tri[0];
    let v1 = tri[2] - tri[0];
    let v2 = p - tri[0];

    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-10 {
        return (-1.0, -1.0, -1.0);
    }

    let inv = 1.0 / denom;
    let v = (d11 * d20 - d01 * d21) * inv;
    let w = (d00 * d21 - d01 * d20) * inv;
    let u = 1.0 - v - w;

    (u, v, w)
}
