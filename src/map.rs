use crate::config::Config;
use anyhow::Context;
use glam::{IVec2, Vec2};
use std::collections::HashMap;
use std::f32::consts::SQRT_2;
use std::fs::read_to_string;
use std::path::Path;

/// map bundled into the binary, used when no path is given
pub(crate) const DEFAULT_MAP: &str = include_str!("../map/default.map");

/// square tile grid, row-major, 0 is open and anything else is solid
#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Grid {
    size: usize,
    tiles: Vec<u8>,
}

impl Grid {
    pub fn from_layout(size: usize, tiles: Vec<u8>) -> anyhow::Result<Self> {
        if size == 0 {
            anyhow::bail!("grid must have at least one tile");
        }
        if tiles.len() != size * size {
            anyhow::bail!(
                "expected {} tiles for a {size}x{size} grid, got {}",
                size * size,
                tiles.len()
            );
        }

        Ok(Self { size, tiles })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// farthest any ray can travel inside the grid
    ///
    /// A safety guard only: rays outrun this on non-finite input, while a ray that misses
    /// every wall leaves the grid through the bounds check first.
    pub fn max_extent(&self) -> f32 {
        self.size as f32 * SQRT_2
    }

    pub fn contains(&self, tile: IVec2) -> bool {
        let size = self.size as i32;
        tile.x >= 0 && tile.x < size && tile.y >= 0 && tile.y < size
    }

    pub fn get(&self, tile: IVec2) -> Option<u8> {
        if !self.contains(tile) {
            return None;
        }
        self.tiles
            .get(tile.y as usize * self.size + tile.x as usize)
            .copied()
    }

    pub fn is_solid(&self, tile: IVec2) -> bool {
        self.get(tile).is_some_and(|value| value > 0)
    }

    /// whether a world position lies inside the grid on an open tile
    pub fn is_open(&self, pos: Vec2) -> bool {
        pos.is_finite() && self.get(tile_of(pos)) == Some(0)
    }

    pub fn idx_to_tile(&self, idx: usize) -> IVec2 {
        IVec2::new((idx % self.size) as i32, (idx / self.size) as i32)
    }

    pub fn tiles(&self) -> impl Iterator<Item = (IVec2, u8)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(idx, &value)| (self.idx_to_tile(idx), value))
    }

    /// whether every edge tile is solid
    pub fn is_bordered(&self) -> bool {
        let last = self.size as i32 - 1;
        self.tiles()
            .filter(|(tile, _)| tile.x == 0 || tile.y == 0 || tile.x == last || tile.y == last)
            .all(|(_, value)| value > 0)
    }
}

/// tile containing a world position
pub(crate) fn tile_of(pos: Vec2) -> IVec2 {
    pos.floor().as_ivec2()
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Map {
    pub grid: Grid,
    /// center of the spawn tile
    pub spawn: Vec2,
    pub config: Config,
}

impl Map {
    pub fn load(name: &Path) -> anyhow::Result<Self> {
        log::info!("loading map at {}", name.display());
        let file = read_to_string(name)
            .with_context(|| format!("could not read map {}", name.display()))?;
        Self::parse(&file)
    }

    pub fn parse(file: &str) -> anyhow::Result<Self> {
        let mut lines = file.lines();
        let mut config = Config::default();
        let mut main = None;

        while let Some(line) = lines.by_ref().next() {
            match line.trim_end() {
                "" => continue,
                "!!!!META" => parse_meta(&mut config, &mut lines)?,
                "!!!!MAIN" => main = Some(parse_main(&mut lines)?),
                other => anyhow::bail!("unrecognized directive: {other}"),
            }
        }

        let (grid, spawn) = main.context("map has no !!!!MAIN section")?;
        if !grid.is_bordered() {
            log::warn!("map border is not fully solid, rays may leave the grid");
        }
        log::debug!("loaded {0}x{0} map, config: {config:?}", grid.size());

        Ok(Self {
            spawn: spawn.as_vec2() + Vec2::splat(0.5),
            grid,
            config,
        })
    }
}

fn parse_meta<'lines>(
    config: &mut Config,
    mut lines: impl Iterator<Item = &'lines str>,
) -> anyhow::Result<()> {
    for line in lines.by_ref() {
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }

        let mut chunks = line.split(',');
        let directive = chunks.by_ref().next().unwrap_or_default();
        let params = chunks
            .map(|param| param.split_once('='))
            .collect::<Option<HashMap<_, _>>>()
            .context("incorrectly formatted meta")?;
        config.apply_directive(directive, &params)?;
    }

    Ok(())
}

fn parse_main<'lines>(
    mut lines: impl Iterator<Item = &'lines str>,
) -> anyhow::Result<(Grid, IVec2)> {
    let mut width = None;
    let mut height = 0;
    let mut tiles = vec![];
    let mut spawn = None;

    for line in lines.by_ref() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }

        let row_len = line.chars().count();
        let expected = *width.get_or_insert(row_len);
        if expected != row_len {
            anyhow::bail!("map row {height} has {row_len} tiles, expected {expected}");
        }

        for (x, tile) in line.chars().enumerate() {
            tiles.push(match tile {
                ' ' | '.' => 0,
                '*' => {
                    if spawn.is_some() {
                        anyhow::bail!("map has more than one spawn");
                    }
                    spawn = Some(IVec2::new(x as i32, height as i32));
                    0
                }
                digit @ '0'..='9' => digit as u8 - b'0',
                other => anyhow::bail!("invalid tile in map: {other}"),
            });
        }
        height += 1;
    }

    let width = width.context("map has no tiles")?;
    if width != height {
        anyhow::bail!("map must be square, got {width}x{height}");
    }

    let grid = Grid::from_layout(height, tiles)?;
    let spawn = match spawn {
        Some(spawn) => spawn,
        None => grid
            .tiles()
            .find(|(_, value)| *value == 0)
            .map(|(tile, _)| tile)
            .context("map has no open tile to spawn in")?,
    };

    Ok((grid, spawn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_layout_checks_length() {
        assert!(Grid::from_layout(3, vec![1; 9]).is_ok());
        assert!(Grid::from_layout(3, vec![1; 8]).is_err());
        assert!(Grid::from_layout(0, vec![]).is_err());
    }

    #[test]
    fn test_lookups_are_bounds_checked() {
        let grid = Grid::from_layout(3, vec![1, 1, 1, 1, 0, 1, 1, 1, 1]).unwrap();
        assert_eq!(grid.get(IVec2::new(1, 1)), Some(0));
        assert_eq!(grid.get(IVec2::new(-1, 1)), None);
        assert_eq!(grid.get(IVec2::new(1, 3)), None);
        assert!(grid.is_solid(IVec2::new(0, 0)));
        assert!(!grid.is_solid(IVec2::new(5, 5)));

        assert!(grid.is_open(Vec2::new(1.5, 1.5)));
        assert!(!grid.is_open(Vec2::new(0.5, 1.5)));
        assert!(!grid.is_open(Vec2::new(-0.5, 1.5)));
        assert!(!grid.is_open(Vec2::new(1.5, 3.2)));
        assert!(!grid.is_open(Vec2::new(f32::NAN, 1.5)));
        assert!(grid.is_bordered());
    }

    #[test]
    fn test_default_map() {
        let map = Map::parse(DEFAULT_MAP).unwrap();
        assert_eq!(map.grid.size(), 16);
        assert!(map.grid.is_bordered());
        assert_eq!(map.spawn, Vec2::new(1.5, 1.5));
        assert_eq!(map.config.heading, 90.);
        assert_eq!(map.config, Config::default());
    }

    #[test]
    fn test_spawn_falls_back_to_first_open_tile() {
        let map = Map::parse("!!!!MAIN\n111\n1.1\n111\n").unwrap();
        assert_eq!(map.spawn, Vec2::new(1.5, 1.5));
        assert!(map.grid.is_bordered());
    }

    #[test]
    fn test_rejects_bad_maps() {
        // not square
        assert!(Map::parse("!!!!MAIN\n1111\n1*01\n1111\n").is_err());
        // ragged rows
        let err = Map::parse("!!!!MAIN\n111\n1*\n111\n").unwrap_err();
        assert_eq!(err.to_string(), "map row 1 has 2 tiles, expected 3");
        // unknown tile
        assert!(Map::parse("!!!!MAIN\n111\n1x1\n111\n").is_err());
        // nowhere to stand
        assert!(Map::parse("!!!!MAIN\n11\n11\n").is_err());
        // two spawns
        assert!(Map::parse("!!!!MAIN\n1111\n1**1\n1001\n1111\n").is_err());
        // missing main section
        assert!(Map::parse("!!!!META\nframe,fps=30\n").is_err());
        // unknown section
        assert!(Map::parse("!!!!SPRITES\n").is_err());
        // malformed meta
        assert!(Map::parse("!!!!META\ncamera,fov\n\n!!!!MAIN\n111\n1*1\n111\n").is_err());
    }

    #[test]
    fn test_meta_overrides_config() {
        let map = Map::parse(
            "!!!!META\ncamera,fov=60,pitch=0\nfog,dof=6,color=#102030\n\n!!!!MAIN\n111\n1*1\n111\n",
        )
        .unwrap();
        assert_eq!(map.config.fov, 60.);
        assert_eq!(map.config.pitch, 0.);
        assert_eq!(map.config.fog.map(|fog| fog.color), Some(0x102030));
    }
}
