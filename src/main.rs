use game::{Game, GameState};
use map::Map;
use sdl2::event::Event;
use sdl2::pixels::PixelFormatEnum;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod config;
mod game;
mod map;
mod ray;
mod render;
mod world;

// helper trait to convert strings into std::error types
trait StringToAnyhow<T> {
    fn ah(self) -> anyhow::Result<T>;
}

impl<T> StringToAnyhow<T> for Result<T, String> {
    fn ah(self) -> anyhow::Result<T> {
        self.map_err(|err| anyhow::anyhow!("{err}"))
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_custom_env("GRIDCAST_LOG");

    // first argument overrides the bundled map
    let map = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Map::load(&path)?,
        None => {
            log::info!("loading bundled map");
            Map::parse(map::DEFAULT_MAP)?
        }
    };
    let width = map.config.width as u32;
    let height = map.config.height as u32;

    // sdl boilerplate
    log::info!("initializing sdl2");
    let sdl_ctx = sdl2::init().ah()?;
    log::info!("initializing video");
    let video = sdl_ctx.video().ah()?;

    log::info!("initializing window");
    let mut window = video
        .window("gridcast", width, height)
        .position_centered()
        .build()?;
    window.set_resizable(false);
    log::info!("creating canvas");
    let mut canvas = window.into_canvas().present_vsync().build()?;
    let texture_creator = canvas.texture_creator();
    log::info!("creating screen texture");
    let mut screen = texture_creator.create_texture_streaming(PixelFormatEnum::RGB888, width, height)?;
    log::info!("pumping events");
    let mut events = sdl_ctx.event_pump().ah()?;

    let mut keys = HashSet::new();

    log::info!("initializing game state");
    let mut game = Game::new(map);

    let delta = Duration::from_millis(1_000 / game.config().fps);
    let mut last_frame = Instant::now();

    'main_loop: loop {
        let prev = Instant::now();
        let dt = prev - last_frame;
        last_frame = prev;

        // handle events
        for ev in events.poll_iter() {
            match ev {
                Event::Quit { .. } => break 'main_loop,
                Event::KeyDown {
                    keycode: Some(k),
                    repeat,
                    ..
                } => {
                    keys.insert(k);

                    if !repeat {
                        game.key_once(k);
                    }
                }
                Event::KeyUp {
                    keycode: Some(k), ..
                } => {
                    keys.remove(&k);
                }
                _ => {}
            }
        }

        if game.game_state == GameState::Exit {
            break 'main_loop;
        }

        game.tick(&keys, dt);

        // draw game
        if game.update {
            game.draw();
            if let Err(err) = screen
                .with_lock(None, |bytes, pitch| game.buffer().copy_into(bytes, pitch))
                .ah()
                .and_then(|()| canvas.copy(&screen, None, None).ah())
            {
                log::error!("error while in game state {:?}: {err}", game.game_state);
                Err(err)?;
            }
            canvas.present();

            game.update = false;
        }

        let diff = Instant::now() - prev;
        if diff < delta {
            std::thread::sleep(delta - diff);
        }
    }

    log::info!("exiting at {:?}", game.pose());
    Ok(())
}
