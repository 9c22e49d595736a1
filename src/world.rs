use crate::map::Grid;
use glam::Vec2;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Intent {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

/// player position in grid units and heading in degrees
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Pose {
    pub pos: Vec2,
    pub heading: f32,
}

impl Pose {
    pub fn new(pos: Vec2, heading: f32) -> Self {
        Self { pos, heading }
    }

    /// unit vector the player is facing
    pub fn facing(&self) -> Vec2 {
        Vec2::from_angle(self.heading.to_radians())
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Movement {
    /// tiles per step
    pub speed: f32,
    /// degrees per step
    pub rotation: f32,
    /// scale steps by elapsed time instead of moving a fixed amount per frame
    pub frame_time_scaled: bool,
    pub reference_fps: f32,
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            speed: 0.03,
            rotation: 1.,
            frame_time_scaled: false,
            reference_fps: 60.,
        }
    }
}

impl Movement {
    fn scale(&self, dt: Duration) -> f32 {
        if self.frame_time_scaled {
            dt.as_secs_f32() * self.reference_fps
        } else {
            1.
        }
    }
}

/// apply this frame's intents in order, refusing any step that would leave open ground
pub(crate) fn apply_intents(
    pose: Pose,
    grid: &Grid,
    intents: impl IntoIterator<Item = Intent>,
    movement: &Movement,
    dt: Duration,
) -> Pose {
    let scale = movement.scale(dt);
    let mut pose = pose;

    for intent in intents {
        let step = pose.facing() * movement.speed * scale;
        match intent {
            Intent::Forward => try_move(&mut pose, grid, step),
            Intent::Backward => try_move(&mut pose, grid, -step),
            Intent::TurnLeft => pose.heading -= movement.rotation * scale,
            Intent::TurnRight => pose.heading += movement.rotation * scale,
        }
    }

    pose
}

fn try_move(pose: &mut Pose, grid: &Grid, step: Vec2) {
    let target = pose.pos + step;
    if grid.is_open(target) {
        pose.pos = target;
    }
}
