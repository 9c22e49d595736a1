use crate::render::View;
use crate::world::Movement;
use anyhow::Context;
use std::collections::HashMap;
use std::str::FromStr;

/// parse a `#RRGGBB` string into a packed `0x00RRGGBB` color
pub(crate) fn parse_hex_color(hex: &str) -> anyhow::Result<u32> {
    let Some(digits) = hex.strip_prefix('#') else {
        anyhow::bail!("not a hex string: {hex}");
    };
    if digits.len() != 6 || !digits.is_ascii() {
        anyhow::bail!("not a hex string: {hex}");
    }

    let r = u8::from_str_radix(&digits[0..2], 16)?;
    let g = u8::from_str_radix(&digits[2..4], 16)?;
    let b = u8::from_str_radix(&digits[4..6], 16)?;

    Ok(u32::from_be_bytes([0, r, g, b]))
}

fn parse_value<T>(directive: &str, key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid value for {directive}.{key}: {value}"))
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Palette {
    pub wall: u32,
    pub shaded_wall: u32,
    pub floor: u32,
    pub ceiling: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            wall: 0x777777,
            shaded_wall: 0x707070,
            floor: 0x202020,
            ceiling: 0x161616,
        }
    }
}

/// distance fog, fully opaque at `dof` tiles
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Fog {
    pub dof: f32,
    pub color: u32,
}

#[derive(Clone, PartialEq, Debug)]
pub(crate) struct Config {
    pub width: usize,
    pub height: usize,
    /// field of view in degrees
    pub fov: f32,
    pub pitch: f32,
    pub wall_height: f32,
    pub fisheye_correction: bool,
    /// initial heading in degrees
    pub heading: f32,
    pub movement: Movement,
    pub palette: Palette,
    pub fog: Option<Fog>,
    pub fps: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            fov: 75.,
            pitch: 50.,
            wall_height: 600.,
            fisheye_correction: false,
            heading: 90.,
            movement: Movement::default(),
            palette: Palette::default(),
            fog: None,
            fps: 60,
        }
    }
}

impl Config {
    pub fn view(&self) -> View {
        View {
            wall_height: self.wall_height,
            pitch: self.pitch,
            palette: self.palette,
            fog: self.fog,
        }
    }

    /// apply one `directive,key=value,...` line from a map's meta section
    pub fn apply_directive(
        &mut self,
        directive: &str,
        params: &HashMap<&str, &str>,
    ) -> anyhow::Result<()> {
        if !matches!(
            directive,
            "screen" | "camera" | "player" | "palette" | "fog" | "frame"
        ) {
            anyhow::bail!("unrecognized meta directive: {directive}");
        }

        for (&key, &value) in params {
            match (directive, key) {
                ("screen", "width") => self.width = parse_value(directive, key, value)?,
                ("screen", "height") => self.height = parse_value(directive, key, value)?,
                ("camera", "fov") => self.fov = parse_value(directive, key, value)?,
                ("camera", "pitch") => self.pitch = parse_value(directive, key, value)?,
                ("camera", "wall_height") => {
                    self.wall_height = parse_value(directive, key, value)?
                }
                ("camera", "fisheye") => {
                    self.fisheye_correction = parse_value(directive, key, value)?
                }
                ("player", "speed") => self.movement.speed = parse_value(directive, key, value)?,
                ("player", "turn") => {
                    self.movement.rotation = parse_value(directive, key, value)?
                }
                ("player", "heading") => self.heading = parse_value(directive, key, value)?,
                ("player", "frame_time") => {
                    self.movement.frame_time_scaled = parse_value(directive, key, value)?
                }
                ("palette", "wall") => self.palette.wall = parse_hex_color(value)?,
                ("palette", "shaded_wall") => self.palette.shaded_wall = parse_hex_color(value)?,
                ("palette", "floor") => self.palette.floor = parse_hex_color(value)?,
                ("palette", "ceiling") => self.palette.ceiling = parse_hex_color(value)?,
                ("fog", "dof" | "color") => {}
                ("frame", "fps") => {
                    self.fps = parse_value(directive, key, value)?;
                    self.movement.reference_fps = self.fps as f32;
                }
                (_, other) => anyhow::bail!("unrecognized key for {directive}: {other}"),
            }
        }

        if directive == "fog" {
            self.fog = Some(Fog {
                dof: parse_value(directive, "dof", params.get("dof").unwrap_or(&"4"))?,
                color: parse_hex_color(params.get("color").unwrap_or(&"#000000"))?,
            });
        }

        if self.width == 0 || self.height == 0 {
            anyhow::bail!("screen dimensions must be non-zero");
        }
        if self.fps == 0 {
            anyhow::bail!("frame rate must be non-zero");
        }
        for (name, value) in [
            ("camera.fov", self.fov),
            ("camera.wall_height", self.wall_height),
        ] {
            if !value.is_finite() || value <= 0. {
                anyhow::bail!("{name} must be a positive number, got {value}");
            }
        }
        for (name, value) in [
            ("camera.pitch", self.pitch),
            ("player.speed", self.movement.speed),
            ("player.turn", self.movement.rotation),
            ("player.heading", self.heading),
        ] {
            if !value.is_finite() {
                anyhow::bail!("{name} must be finite, got {value}");
            }
        }
        if let Some(fog) = self.fog {
            if !fog.dof.is_finite() || fog.dof <= 0. {
                anyhow::bail!("fog.dof must be a positive number, got {}", fog.dof);
            }
        }

        Ok(())
    }
}
