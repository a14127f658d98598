// Engine value types.
//
// Vectors, quaternions and matrices are glam types; composite engine types
// without a glam equivalent are plain structs with glam fields. All of them
// are `Copy` and cross the ABI as packed `f32`/`i32` payloads.

use glam::{IVec2, IVec3, IVec4, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

pub type Vector2 = Vec2;
pub type Vector3 = Vec3;
pub type Vector4 = Vec4;
pub type Vector2i = IVec2;
pub type Vector3i = IVec3;
pub type Vector4i = IVec4;
pub type Quaternion = Quat;
pub type Basis = Mat3;
pub type Projection = Mat4;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Linear RGBA color, components in `0.0..=1.0` for non-HDR values.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [f32; 4]) -> Self {
        Color::new(c[0], c[1], c[2], c[3])
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl From<Color> for Vec4 {
    fn from(c: Color) -> Vec4 {
        Vec4::new(c.r, c.g, c.b, c.a)
    }
}

impl From<Vec4> for Color {
    fn from(v: Vec4) -> Color {
        Color::new(v.x, v.y, v.z, v.w)
    }
}

// ---------------------------------------------------------------------------
// Rect2 / Rect2i / Aabb
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect2 {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect2 {
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Rect2 { position, size }
    }

    pub fn from_components(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect2::new(Vec2::new(x, y), Vec2::new(width, height))
    }

    pub fn end(&self) -> Vec2 {
        self.position + self.size
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        let end = self.end();
        point.x >= self.position.x && point.y >= self.position.y && point.x < end.x && point.y < end.y
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect2i {
    pub position: IVec2,
    pub size: IVec2,
}

impl Rect2i {
    pub const fn new(position: IVec2, size: IVec2) -> Self {
        Rect2i { position, size }
    }

    pub fn from_components(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect2i::new(IVec2::new(x, y), IVec2::new(width, height))
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub position: Vec3,
    pub size: Vec3,
}

impl Aabb {
    pub const fn new(position: Vec3, size: Vec3) -> Self {
        Aabb { position, size }
    }

    pub fn end(&self) -> Vec3 {
        self.position + self.size
    }

    pub fn volume(&self) -> f32 {
        self.size.x * self.size.y * self.size.z
    }
}

// ---------------------------------------------------------------------------
// Plane
// ---------------------------------------------------------------------------

/// Plane in Hessian normal form: points `p` with `normal.dot(p) == d`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Plane { normal, d }
    }

    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.d
    }
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// 2D affine transform: basis columns `x`, `y` plus `origin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub x: Vec2,
    pub y: Vec2,
    pub origin: Vec2,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        x: Vec2::X,
        y: Vec2::Y,
        origin: Vec2::ZERO,
    };

    pub const fn new(x: Vec2, y: Vec2, origin: Vec2) -> Self {
        Transform2D { x, y, origin }
    }

    pub fn xform(&self, v: Vec2) -> Vec2 {
        self.x * v.x + self.y * v.y + self.origin
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3D {
    pub basis: Mat3,
    pub origin: Vec3,
}

impl Transform3D {
    pub const IDENTITY: Transform3D = Transform3D {
        basis: Mat3::IDENTITY,
        origin: Vec3::ZERO,
    };

    pub const fn new(basis: Mat3, origin: Vec3) -> Self {
        Transform3D { basis, origin }
    }

    pub fn from_translation(origin: Vec3) -> Self {
        Transform3D::new(Mat3::IDENTITY, origin)
    }

    pub fn xform(&self, v: Vec3) -> Vec3 {
        self.basis * v + self.origin
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Rid
// ---------------------------------------------------------------------------

/// Opaque engine resource id. `0` is the invalid id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid(pub u64);

impl Rid {
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

// ---------------------------------------------------------------------------
// Wire packing
// ---------------------------------------------------------------------------
//
// Row-major for `Basis` (rows = engine `Vector3` rows), column-major for
// `Projection`, matching the raw variant layout.

pub(crate) fn basis_to_rows(b: &Mat3) -> [f32; 9] {
    b.transpose().to_cols_array()
}

pub(crate) fn basis_from_rows(r: &[f32]) -> Mat3 {
    let mut rows = [0.0f32; 9];
    rows.copy_from_slice(&r[..9]);
    Mat3::from_cols_array(&rows).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transforms_leave_points_alone() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Transform3D::IDENTITY.xform(p), p);
        assert_eq!(Transform2D::IDENTITY.xform(Vec2::new(4.0, 5.0)), Vec2::new(4.0, 5.0));
    }

    #[test]
    fn basis_rows_round_trip() {
        let b = Mat3::from_cols(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::new(7.0, 8.0, 9.0));
        let rows = basis_to_rows(&b);
        // First row holds the x component of every column.
        assert_eq!(&rows[..3], &[1.0, 4.0, 7.0]);
        assert_eq!(basis_from_rows(&rows), b);
    }

    #[test]
    fn rect_contains() {
        let r = Rect2::from_components(0.0, 0.0, 2.0, 2.0);
        assert!(r.contains_point(Vec2::new(1.0, 1.0)));
        assert!(!r.contains_point(Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn plane_distance() {
        let plane = Plane::new(Vec3::Y, 1.0);
        assert_eq!(plane.distance_to(Vec3::new(0.0, 3.0, 0.0)), 2.0);
        assert!(!Rid::default().is_valid());
    }
}
