use crate::config::Config;
use crate::map::{Grid, Map};
use crate::ray::{self, RayHit};
use crate::render::{self, PixelBuffer};
use crate::world::{self, Intent, Pose};
use glam::Vec2;
use sdl2::keyboard::Keycode;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum GameState {
    Playing,
    Minimap,
    Paused,
    Exit,
}

/// held key to movement intent
pub(crate) fn key_intent(key: Keycode) -> Option<Intent> {
    match key {
        Keycode::Up | Keycode::W => Some(Intent::Forward),
        Keycode::Down | Keycode::S => Some(Intent::Backward),
        Keycode::Left | Keycode::A => Some(Intent::TurnLeft),
        Keycode::Right | Keycode::D => Some(Intent::TurnRight),
        _ => None,
    }
}

/// one frame's render: a fixed pose snapshot painted into a borrowed buffer
pub(crate) struct Frame<'a> {
    pub buffer: &'a mut PixelBuffer,
    pub pose: Pose,
    pub grid: &'a Grid,
    pub config: &'a Config,
}

impl Frame<'_> {
    /// cast and paint every column, recording each ray's direction and hit
    pub fn render(self, hits: &mut Vec<(Vec2, RayHit)>) {
        let Self {
            buffer,
            pose,
            grid,
            config,
        } = self;
        let view = config.view();
        let width = buffer.width();

        hits.clear();
        buffer.clear(0);

        for column in 0..width {
            let angle = ray::ray_angle(pose.heading, column, width, config.fov);
            let hit = ray::cast(&pose, grid, column, width, config.fov);

            // only the projection is corrected, the recorded hit stays on the wall
            let mut projected = hit;
            if config.fisheye_correction {
                if let RayHit::Wall { distance, .. } = &mut projected {
                    *distance *= (angle - pose.heading).to_radians().cos();
                }
            }

            render::paint_column(buffer, column, &projected, &view);
            hits.push((Vec2::from_angle(angle.to_radians()), hit));
        }
    }
}

pub(crate) struct Game {
    grid: Grid,
    config: Config,
    pose: Pose,
    buffer: PixelBuffer,
    hits: Vec<(Vec2, RayHit)>,
    pub game_state: GameState,
    pub update: bool,
}

impl Game {
    /// initialize game
    pub fn new(map: Map) -> Self {
        let Map {
            grid,
            spawn,
            config,
        } = map;

        Self {
            pose: Pose::new(spawn, config.heading),
            buffer: PixelBuffer::new(config.width, config.height),
            hits: Vec::with_capacity(config.width),
            grid,
            config,
            game_state: GameState::Playing,
            update: true,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// handle key presses that toggle state rather than repeat
    pub fn key_once(&mut self, key: Keycode) {
        match (self.game_state, key) {
            (_, Keycode::Escape) => self.game_state = GameState::Exit,
            (GameState::Paused, Keycode::P) => self.game_state = GameState::Playing,
            (GameState::Playing | GameState::Minimap, Keycode::P) => {
                self.game_state = GameState::Paused
            }
            (GameState::Playing, Keycode::M) => self.game_state = GameState::Minimap,
            (GameState::Minimap, Keycode::M) => self.game_state = GameState::Playing,
            _ => return,
        }

        self.update = true;
    }

    /// apply the intents of every held key for one frame
    pub fn tick(&mut self, keys: &HashSet<Keycode>, dt: Duration) {
        if !matches!(self.game_state, GameState::Playing | GameState::Minimap) {
            return;
        }

        let mut intents = keys.iter().copied().filter_map(key_intent).collect::<Vec<_>>();
        if intents.is_empty() {
            return;
        }
        // held keys come out of the set in no particular order
        intents.sort_by_key(|intent| *intent as u8);

        self.pose = world::apply_intents(
            self.pose,
            &self.grid,
            intents,
            &self.config.movement,
            dt,
        );
        self.update = true;
    }

    /// paint the current view into the buffer
    pub fn draw(&mut self) {
        if self.game_state == GameState::Paused {
            return;
        }

        Frame {
            buffer: &mut self.buffer,
            pose: self.pose,
            grid: &self.grid,
            config: &self.config,
        }
        .render(&mut self.hits);

        if self.game_state == GameState::Minimap {
            render::paint_minimap(
                &mut self.buffer,
                &self.grid,
                self.pose.pos,
                &self.hits,
                &self.config.palette,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Palette;
    use crate::render::{MINIMAP_PLAYER, MINIMAP_SEEN};

    fn small_map() -> Map {
        Map::parse(
            "!!!!META\nscreen,width=64,height=48\nplayer,heading=0\n\n!!!!MAIN\n11111\n1*001\n10001\n10001\n11111\n",
        )
        .unwrap()
    }

    #[test]
    fn test_key_intent() {
        assert_eq!(key_intent(Keycode::W), Some(Intent::Forward));
        assert_eq!(key_intent(Keycode::Down), Some(Intent::Backward));
        assert_eq!(key_intent(Keycode::A), Some(Intent::TurnLeft));
        assert_eq!(key_intent(Keycode::Right), Some(Intent::TurnRight));
        assert_eq!(key_intent(Keycode::Q), None);
    }

    #[test]
    fn test_new_game_spawns_on_map() {
        let game = Game::new(small_map());
        assert_eq!(game.pose(), Pose::new(Vec2::new(1.5, 1.5), 0.));
        assert_eq!(game.buffer().width(), 64);
        assert_eq!(game.buffer().height(), 48);
        assert_eq!(game.game_state, GameState::Playing);
    }

    #[test]
    fn test_tick_moves_player() {
        let mut game = Game::new(small_map());
        game.update = false;

        game.tick(&HashSet::new(), Duration::ZERO);
        assert!(!game.update);

        let keys = HashSet::from([Keycode::Up, Keycode::Right]);
        game.tick(&keys, Duration::ZERO);
        assert!(game.update);
        assert!(game.pose().pos.x > 1.5);
        assert_eq!(game.pose().heading, 1.);
    }

    #[test]
    fn test_pause_freezes_player() {
        let mut game = Game::new(small_map());
        game.key_once(Keycode::P);
        assert_eq!(game.game_state, GameState::Paused);

        game.tick(&HashSet::from([Keycode::Up]), Duration::ZERO);
        assert_eq!(game.pose().pos, Vec2::new(1.5, 1.5));

        game.key_once(Keycode::P);
        assert_eq!(game.game_state, GameState::Playing);
        game.key_once(Keycode::M);
        assert_eq!(game.game_state, GameState::Minimap);
        game.key_once(Keycode::Escape);
        assert_eq!(game.game_state, GameState::Exit);
    }

    #[test]
    fn test_draw_paints_every_pixel() {
        let mut game = Game::new(small_map());
        game.draw();

        let palette = game.config().palette;
        let colors = [
            palette.wall,
            palette.shaded_wall,
            palette.floor,
            palette.ceiling,
        ];
        let buffer = game.buffer();
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let pixel = buffer.get(x, y).unwrap();
                assert!(colors.contains(&pixel), "unpainted pixel at {x},{y}");
            }
        }
        assert!(game.hits.iter().all(|(_, hit)| hit.distance().is_some()));
        assert_eq!(game.hits.len(), 64);
    }

    fn wall_rows(buffer: &PixelBuffer, x: usize, palette: &Palette) -> usize {
        (0..buffer.height())
            .filter_map(|y| buffer.get(x, y))
            .filter(|&pixel| pixel == palette.wall || pixel == palette.shaded_wall)
            .count()
    }

    #[test]
    fn test_fisheye_correction_makes_edge_walls_taller() {
        let map = small_map();
        let mut plain = map.config.clone();
        plain.wall_height = 20.;
        plain.pitch = 0.;
        let mut corrected = plain.clone();
        corrected.fisheye_correction = true;

        let render = |config: &Config| {
            let mut buffer = PixelBuffer::new(64, 48);
            let mut hits = Vec::new();
            Frame {
                buffer: &mut buffer,
                pose: Pose::new(map.spawn, 0.),
                grid: &map.grid,
                config,
            }
            .render(&mut hits);
            (buffer, hits)
        };
        let (plain_buffer, plain_hits) = render(&plain);
        let (corrected_buffer, corrected_hits) = render(&corrected);

        let palette = plain.palette;
        assert!(
            wall_rows(&corrected_buffer, 0, &palette) > wall_rows(&plain_buffer, 0, &palette)
        );
        assert_eq!(
            wall_rows(&corrected_buffer, 32, &palette),
            wall_rows(&plain_buffer, 32, &palette)
        );
        // recorded hits are the true ray lengths either way
        assert_eq!(corrected_hits, plain_hits);
    }

    #[test]
    fn test_minimap_hits_land_on_walls_with_fisheye() {
        let mut map = small_map();
        map.config.fisheye_correction = true;
        let mut game = Game::new(map);
        game.key_once(Keycode::M);
        game.draw();

        let pos = game.pose().pos;
        for (dir, hit) in &game.hits {
            let point = pos + *dir * hit.distance().unwrap();
            let on_line = |v: f32| (v - v.round()).abs() < 1e-4;
            assert!(
                on_line(point.x) || on_line(point.y),
                "hit point {point} is not on a grid line"
            );
        }
    }

    #[test]
    fn test_paused_draw_keeps_last_frame() {
        let mut game = Game::new(small_map());
        game.draw();
        let before = game.buffer().clone();

        game.key_once(Keycode::P);
        game.pose.heading = 180.;
        game.draw();
        assert_eq!(game.buffer(), &before);

        game.key_once(Keycode::P);
        game.draw();
        assert_ne!(game.buffer(), &before);
    }

    #[test]
    fn test_minimap_draws_over_view() {
        let mut game = Game::new(small_map());
        game.key_once(Keycode::M);
        game.draw();

        let palette = game.config().palette;
        let buffer = game.buffer();
        // border tile, open tile, then the player at the center of tile (1, 1)
        let corner = buffer.get(0, 0).unwrap();
        assert!(corner == palette.wall || corner == MINIMAP_SEEN);
        assert_eq!(buffer.get(20, 20), Some(palette.floor));
        assert_eq!(buffer.get(12, 12), Some(MINIMAP_PLAYER));
        // outside the map the first-person view is untouched
        assert_ne!(buffer.get(63, 47), Some(0));
    }
}
