use crate::environment::dino::algebra_2d::Rect;
use crate::environment::dino::frame_factor;
use crate::environment::dino::sprites::{
    Size, BIRD, BIRD_ANIMATION_INTERVAL, BIRD_HEIGHTS, BIRD_SHRINK, BONUS_HIGH_OFFSET, BONUS_LOW_OFFSET,
    BONUS_SIZE, LARGE_CACTUS, LARGE_CACTUS_SHRINK, LARGE_CACTUS_Y, SMALL_CACTUS, SMALL_CACTUS_SHRINK,
    SMALL_CACTUS_Y, WIDE_CACTUS_MIN_WIDTH, WIDE_CACTUS_SHRINK,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CactusSize {
    Small,
    Large,
}

/// Flight level of a bird
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BirdHeight {
    /// unjumpable, pass under it
    High,
    /// duck
    Mid,
    /// ground-level flight, jump
    Low,
}

impl BirdHeight {
    pub const ALL: [BirdHeight; 3] = [BirdHeight::High, BirdHeight::Mid, BirdHeight::Low];

    pub fn y(&self) -> f32 {
        match self {
            BirdHeight::High => BIRD_HEIGHTS[0],
            BirdHeight::Mid => BIRD_HEIGHTS[1],
            BirdHeight::Low => BIRD_HEIGHTS[2],
        }
    }
}

/// What to spawn, decided by a spawn policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObstacleSpec {
    Cactus { size: CactusSize, variant: usize },
    Bird { height: BirdHeight },
    /// `high`: only reachable by jumping
    Bonus { high: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub enum ObstacleKind {
    Cactus { size: CactusSize, variant: usize },
    Bird { height: BirdHeight, anim_frame: u8, anim_timer: f32 },
    Bonus { collected: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    x: f32,
    y: f32,
    size: Size,
    /// hitbox inset: twice this value horizontally, once vertically
    shrink: i32,
    hitbox: Rect,
    passed: bool,
    kind: ObstacleKind,
}

impl Obstacle {
    pub fn spawn(spec: ObstacleSpec, x: f32, ground_y: f32) -> Self {
        let (y, size, shrink, kind) = match spec {
            ObstacleSpec::Cactus { size: CactusSize::Large, variant } => {
                let sprite = LARGE_CACTUS[variant % LARGE_CACTUS.len()];
                let shrink = if sprite.0 >= WIDE_CACTUS_MIN_WIDTH {
                    WIDE_CACTUS_SHRINK
                } else {
                    LARGE_CACTUS_SHRINK
                };
                (LARGE_CACTUS_Y, sprite, shrink, ObstacleKind::Cactus { size: CactusSize::Large, variant })
            }
            ObstacleSpec::Cactus { size: CactusSize::Small, variant } => {
                let sprite = SMALL_CACTUS[variant % SMALL_CACTUS.len()];
                (SMALL_CACTUS_Y, sprite, SMALL_CACTUS_SHRINK, ObstacleKind::Cactus { size: CactusSize::Small, variant })
            }
            ObstacleSpec::Bird { height } => (
                height.y(),
                BIRD,
                BIRD_SHRINK,
                ObstacleKind::Bird {
                    height,
                    anim_frame: 0,
                    anim_timer: 0.0,
                },
            ),
            ObstacleSpec::Bonus { high } => {
                let offset = if high { BONUS_HIGH_OFFSET } else { BONUS_LOW_OFFSET };
                (ground_y - offset, (BONUS_SIZE, BONUS_SIZE), 0, ObstacleKind::Bonus { collected: false })
            }
        };

        let mut obstacle = Self {
            x,
            y,
            size,
            shrink,
            hitbox: Rect::default(),
            passed: false,
            kind,
        };
        obstacle.hitbox = obstacle.compute_hitbox();
        obstacle
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn hitbox(&self) -> Rect {
        self.hitbox
    }

    pub fn kind(&self) -> &ObstacleKind {
        &self.kind
    }

    pub fn sprite_rect(&self) -> Rect {
        Rect::at(self.x, self.y, self.size)
    }

    pub fn is_bonus(&self) -> bool {
        matches!(self.kind, ObstacleKind::Bonus { .. })
    }

    pub fn is_collected(&self) -> bool {
        matches!(self.kind, ObstacleKind::Bonus { collected: true })
    }

    /// Marks an uncollected bonus as collected; returns false for anything else
    pub fn collect(&mut self) -> bool {
        match &mut self.kind {
            ObstacleKind::Bonus { collected } if !*collected => {
                *collected = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    /// Sets the passed flag once the right edge is left of `dino_x`.
    /// Returns true only on the tick this happens.
    pub fn mark_passed(&mut self, dino_x: f32) -> bool {
        if !self.passed && self.x + (self.hitbox.w as f32) < dino_x {
            self.passed = true;
            return true;
        }
        false
    }

    pub fn offscreen(&self) -> bool {
        self.x + (self.hitbox.w as f32) < 0.0
    }

    /// Observation code: cactus 0.0, bird 0.5, bonus 1.0
    pub fn kind_code(&self) -> f32 {
        match self.kind {
            ObstacleKind::Cactus { .. } => 0.0,
            ObstacleKind::Bird { .. } => 0.5,
            ObstacleKind::Bonus { .. } => 1.0,
        }
    }

    pub fn update(&mut self, speed: f32, dt: f32) {
        self.x -= speed * frame_factor(dt);
        self.hitbox = self.compute_hitbox();

        if let ObstacleKind::Bird { anim_frame, anim_timer, .. } = &mut self.kind {
            *anim_timer += dt;
            if *anim_timer >= BIRD_ANIMATION_INTERVAL {
                *anim_timer = 0.0;
                *anim_frame = (*anim_frame + 1) % 2;
            }
        }
    }

    fn compute_hitbox(&self) -> Rect {
        self.sprite_rect().inset_bottom_aligned(self.shrink * 2, self.shrink)
    }
}
