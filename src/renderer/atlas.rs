use glam::{Mat4, UVec2};

use crate::renderer::commands::{ClipConventions, Viewport};

/// Square grid the shadow atlas is divided into for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub tiles: u32,
    pub split: u32,
    pub tile_size: u32,
}

impl AtlasLayout {
    pub fn new(tiles: u32, atlas_size: u32) -> Self {
        let split = atlas_split(tiles);
        debug_assert!(
            split * split >= tiles,
            "{tiles} shadow tiles do not fit a {split}x{split} atlas"
        );
        Self {
            tiles,
            split,
            tile_size: atlas_size / split,
        }
    }

    pub fn tile_offset(&self, tile_index: u32) -> UVec2 {
        tile_offset(tile_index, self.split)
    }

    pub fn tile_viewport(&self, tile_index: u32) -> Viewport {
        let offset = self.tile_offset(tile_index);
        let size = self.tile_size as f32;
        Viewport {
            x: offset.x as f32 * size,
            y: offset.y as f32 * size,
            width: size,
            height: size,
        }
    }
}

/// Grid dimension for `tiles` tiles. Always a power of two so tile sizes
/// divide the atlas evenly.
pub const fn atlas_split(tiles: u32) -> u32 {
    if tiles <= 1 {
        1
    } else if tiles <= 4 {
        2
    } else {
        4
    }
}

/// Row-major tile placement, x advancing fastest.
pub const fn tile_offset(tile_index: u32, split: u32) -> UVec2 {
    UVec2::new(tile_index % split, tile_index / split)
}

/// Turns a light's GL-convention clip matrix into one that maps world
/// positions straight to atlas texture coordinates and depth in `[0, 1]`.
pub fn convert_to_atlas_matrix(
    m: Mat4,
    offset: UVec2,
    split: u32,
    conventions: ClipConventions,
) -> Mat4 {
    let offset = offset.as_vec2();
    let scale = 1.0 / split as f32;

    let r0 = m.row(0);
    let r1 = m.row(1);
    let mut r2 = m.row(2);
    let r3 = m.row(3);

    if conventions.reversed_z {
        r2 = -r2;
    }

    let x = (0.5 * (r0 + r3) + offset.x * r3) * scale;
    let y = if conventions.flip_y {
        (0.5 * (r3 - r1) + offset.y * r3) * scale
    } else {
        (0.5 * (r1 + r3) + offset.y * r3) * scale
    };
    let z = 0.5 * (r2 + r3);

    Mat4::from_cols(x, y, z, r3).transpose()
}
