use crate::config::{Fog, Palette};
use crate::map::Grid;
use crate::ray::{RayHit, Side};
use glam::Vec2;

/// closest distance a wall is projected from, keeps heights finite
pub(crate) const MIN_DISTANCE: f32 = 1e-4;

/// side length in pixels of one minimap tile
const MINIMAP_CELL: usize = 8;
pub(crate) const MINIMAP_PLAYER: u32 = 0x00ff00;
const MINIMAP_HIT: u32 = 0x00dd00;
pub(crate) const MINIMAP_SEEN: u32 = 0x999999;

/// row-major buffer of `0x00RRGGBB` pixels
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn set(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    /// copy into a 32-bit XRGB texture with `pitch` bytes per row
    pub fn copy_into(&self, bytes: &mut [u8], pitch: usize) {
        if self.width == 0 || pitch == 0 {
            return;
        }
        for (row, dst) in self.pixels.chunks(self.width).zip(bytes.chunks_mut(pitch)) {
            for (pixel, out) in row.iter().zip(dst.chunks_exact_mut(4)) {
                out.copy_from_slice(&pixel.to_ne_bytes());
            }
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.pixels[row * self.width + col] = color;
            }
        }
    }
}

/// everything a column needs besides the hit itself
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct View {
    pub wall_height: f32,
    pub pitch: f32,
    pub palette: Palette,
    pub fog: Option<Fog>,
}

/// on-screen wall height for a distance
pub(crate) fn projected_height(distance: f32, wall_height: f32) -> f32 {
    wall_height / distance.max(MIN_DISTANCE)
}

/// vertical extent of a wall slab, rows `start..end`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Slab {
    pub start: usize,
    pub end: usize,
}

impl Slab {
    pub fn new(screen_height: usize, height: f32, pitch: f32) -> Self {
        let center = screen_height as f32 / 2. + pitch;
        let clamp = |row: f32| row.clamp(0., screen_height as f32) as usize;
        Self {
            start: clamp(center - height / 2.),
            end: clamp(center + height / 2.),
        }
    }
}

fn horizon(screen_height: usize, pitch: f32) -> usize {
    (screen_height as f32 / 2. + pitch).clamp(0., screen_height as f32) as usize
}

/// blend `color` toward `target` by `amount` in `0..=1`
fn mix(color: u32, target: u32, amount: f32) -> u32 {
    let [_, r, g, b] = color.to_be_bytes();
    let [_, tr, tg, tb] = target.to_be_bytes();
    let lerp = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount).round() as u8;
    u32::from_be_bytes([0, lerp(r, tr), lerp(g, tg), lerp(b, tb)])
}

fn wall_color(view: &View, side: Side, distance: f32) -> u32 {
    // slightly discolor walls that face different directions for contrast
    let color = match side {
        Side::Horizontal => view.palette.wall,
        Side::Vertical => view.palette.shaded_wall,
    };
    match view.fog {
        Some(Fog { dof, color: fog }) if dof > 0. => {
            mix(color, fog, (distance / dof).clamp(0., 1.))
        }
        _ => color,
    }
}

/// paint every row of one screen column: ceiling, then wall slab, then floor
pub(crate) fn paint_column(buffer: &mut PixelBuffer, column: usize, hit: &RayHit, view: &View) {
    if column >= buffer.width() {
        return;
    }

    let screen_height = buffer.height();
    let (slab, wall) = match *hit {
        RayHit::Wall { distance, side, .. } => (
            Slab::new(
                screen_height,
                projected_height(distance, view.wall_height),
                view.pitch,
            ),
            wall_color(view, side, distance),
        ),
        // no wall band, floor starts at the horizon
        RayHit::Sky => {
            let horizon = horizon(screen_height, view.pitch);
            (
                Slab {
                    start: horizon,
                    end: horizon,
                },
                view.palette.floor,
            )
        }
    };

    for y in 0..screen_height {
        let color = if y < slab.start {
            view.palette.ceiling
        } else if y < slab.end {
            wall
        } else {
            view.palette.floor
        };
        buffer.set(column, y, color);
    }
}

/// overhead map in the top left corner, with the walls in view, each column's hit point and the player
pub(crate) fn paint_minimap(
    buffer: &mut PixelBuffer,
    grid: &Grid,
    player: Vec2,
    hits: &[(Vec2, RayHit)],
    palette: &Palette,
) {
    for (tile, value) in grid.tiles() {
        let color = if value > 0 {
            palette.wall
        } else {
            palette.floor
        };
        buffer.fill_rect(
            tile.x as usize * MINIMAP_CELL,
            tile.y as usize * MINIMAP_CELL,
            MINIMAP_CELL,
            MINIMAP_CELL,
            color,
        );
    }

    let to_screen = |pos: Vec2| {
        let px = pos * MINIMAP_CELL as f32;
        (px.x >= 0. && px.y >= 0.).then(|| (px.x as usize, px.y as usize))
    };

    // walls in view
    for (_, hit) in hits {
        if let RayHit::Wall { tile, .. } = hit {
            buffer.fill_rect(
                tile.x as usize * MINIMAP_CELL,
                tile.y as usize * MINIMAP_CELL,
                MINIMAP_CELL,
                MINIMAP_CELL,
                MINIMAP_SEEN,
            );
        }
    }

    for (dir, hit) in hits {
        if let Some((x, y)) = hit.distance().and_then(|d| to_screen(player + *dir * d)) {
            buffer.set(x, y, MINIMAP_HIT);
        }
    }

    if let Some((x, y)) = to_screen(player) {
        buffer.fill_rect(x.saturating_sub(1), y.saturating_sub(1), 3, 3, MINIMAP_PLAYER);
    }
}
