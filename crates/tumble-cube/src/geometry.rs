//! Static cube mesh.
//!
//! A cube of half-extent 1 centered at the origin, four vertices per face so
//! each face gets its own atlas tile. The atlas is a 3×2 grid read row-major
//! from the top-left: front, back, top / bottom, left, right.
//!
//! Face corners are listed bottom-left, bottom-right, top-right, top-left as
//! seen from outside the cube, so both triangles of every face wind
//! counter-clockwise.

pub const VERTEX_COUNT: usize = 24;
pub const INDEX_COUNT: u32 = 36;

pub const POSITION_COMPONENTS: u32 = 3;
pub const UV_COMPONENTS: u32 = 2;

const THIRD: f32 = 1.0 / 3.0;
const TWO_THIRDS: f32 = 2.0 / 3.0;

#[rustfmt::skip]
pub const CUBE_POSITIONS: [f32; VERTEX_COUNT * 3] = [
    // front (+z)
    -1.0, -1.0,  1.0,    1.0, -1.0,  1.0,    1.0,  1.0,  1.0,   -1.0,  1.0,  1.0,
    // back (-z)
     1.0, -1.0, -1.0,   -1.0, -1.0, -1.0,   -1.0,  1.0, -1.0,    1.0,  1.0, -1.0,
    // top (+y)
    -1.0,  1.0,  1.0,    1.0,  1.0,  1.0,    1.0,  1.0, -1.0,   -1.0,  1.0, -1.0,
    // bottom (-y)
    -1.0, -1.0, -1.0,    1.0, -1.0, -1.0,    1.0, -1.0,  1.0,   -1.0, -1.0,  1.0,
    // left (-x)
    -1.0, -1.0, -1.0,   -1.0, -1.0,  1.0,   -1.0,  1.0,  1.0,   -1.0,  1.0, -1.0,
    // right (+x)
     1.0, -1.0,  1.0,    1.0, -1.0, -1.0,    1.0,  1.0, -1.0,    1.0,  1.0,  1.0,
];

// v = 0 is the top row of the image.
#[rustfmt::skip]
pub const CUBE_UVS: [f32; VERTEX_COUNT * 2] = [
    // front: column 0, row 0
    0.0,        0.5,   THIRD,      0.5,   THIRD,      0.0,   0.0,        0.0,
    // back: column 1, row 0
    THIRD,      0.5,   TWO_THIRDS, 0.5,   TWO_THIRDS, 0.0,   THIRD,      0.0,
    // top: column 2, row 0
    TWO_THIRDS, 0.5,   1.0,        0.5,   1.0,        0.0,   TWO_THIRDS, 0.0,
    // bottom: column 0, row 1
    0.0,        1.0,   THIRD,      1.0,   THIRD,      0.5,   0.0,        0.5,
    // left: column 1, row 1
    THIRD,      1.0,   TWO_THIRDS, 1.0,   TWO_THIRDS, 0.5,   THIRD,      0.5,
    // right: column 2, row 1
    TWO_THIRDS, 1.0,   1.0,        1.0,   1.0,        0.5,   TWO_THIRDS, 0.5,
];

#[rustfmt::skip]
pub const CUBE_INDICES: [u16; INDEX_COUNT as usize] = [
     0,  1,  2,    0,  2,  3,
     4,  5,  6,    4,  6,  7,
     8,  9, 10,    8, 10, 11,
    12, 13, 14,   12, 14, 15,
    16, 17, 18,   16, 18, 19,
    20, 21, 22,   20, 22, 23,
];
