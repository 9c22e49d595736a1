use crate::map::{tile_of, Grid};
use crate::world::Pose;
use glam::{IVec2, Vec2};

/// which kind of grid line a ray crossed when it hit
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Side {
    /// stepped along x, crossing a vertical grid line
    Vertical,
    /// stepped along y, crossing a horizontal grid line
    Horizontal,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum RayHit {
    Wall {
        /// length along the ray to the crossed boundary
        distance: f32,
        side: Side,
        tile: IVec2,
    },
    /// left the grid or outran it without hitting anything
    Sky,
}

impl RayHit {
    pub fn distance(&self) -> Option<f32> {
        match self {
            Self::Wall { distance, .. } => Some(*distance),
            Self::Sky => None,
        }
    }
}

/// angle in degrees of the ray for a screen column, sweeping the field of view left to right
pub(crate) fn ray_angle(heading: f32, column: usize, screen_width: usize, fov: f32) -> f32 {
    heading + (column as f32 / screen_width as f32 - 0.5) * fov
}

/// cast the ray for one screen column
pub(crate) fn cast(
    pose: &Pose,
    grid: &Grid,
    column: usize,
    screen_width: usize,
    fov: f32,
) -> RayHit {
    let angle = ray_angle(pose.heading, column, screen_width, fov);
    cast_dir(pose.pos, Vec2::from_angle(angle.to_radians()), grid)
}

/// ray length spent crossing one whole tile along one axis, and the length to the first crossing
fn axis(pos: f32, tile: i32, dir: f32, other: f32) -> (i32, f32, f32) {
    // parallel to this axis' grid lines: never crosses one
    if dir == 0. {
        return (0, f32::INFINITY, f32::INFINITY);
    }

    let step_size = (1. + (other / dir) * (other / dir)).sqrt();
    if !step_size.is_finite() {
        return (0, f32::INFINITY, f32::INFINITY);
    }
    if dir < 0. {
        (-1, step_size, (pos - tile as f32) * step_size)
    } else {
        (1, step_size, (tile as f32 + 1. - pos) * step_size)
    }
}

/// grid traversal from `origin` along `dir`, one tile boundary at a time
pub(crate) fn cast_dir(origin: Vec2, dir: Vec2, grid: &Grid) -> RayHit {
    let mut tile = tile_of(origin);
    let (step_x, step_size_x, mut len_x) = axis(origin.x, tile.x, dir.x, dir.y);
    let (step_y, step_size_y, mut len_y) = axis(origin.y, tile.y, dir.y, dir.x);

    let max_extent = grid.max_extent();
    let mut distance = 0.;
    while distance < max_extent {
        let side = if len_x < len_y {
            tile.x += step_x;
            distance = len_x;
            len_x += step_size_x;
            Side::Vertical
        } else {
            tile.y += step_y;
            distance = len_y;
            len_y += step_size_y;
            Side::Horizontal
        };

        if !grid.contains(tile) {
            return RayHit::Sky;
        }
        if grid.is_solid(tile) {
            return RayHit::Wall {
                distance,
                side,
                tile,
            };
        }
    }

    RayHit::Sky
}
