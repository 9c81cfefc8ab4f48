use crate::environment::dino::algebra_2d::Rect;
use crate::environment::dino::frame_factor;
use crate::environment::dino::sprites::{
    Size, DINO_ANIMATION_INTERVAL, DINO_DUCK, DINO_HITBOX_INSET, DINO_JUMP, DINO_RUN, DUCK_OFFSET_Y,
};

/// The player character. Only moves vertically; x stays fixed.
#[derive(Clone, Debug, PartialEq)]
pub struct Dino {
    x: f32,
    y: f32,
    vy: f32,
    on_ground: bool,
    ducking: bool,
    ground_y: f32,
    jump_vel: f32,
    gravity: f32,
    anim_frame: u8,
    anim_timer: f32,
    hitbox: Rect,
}

impl Dino {
    pub fn new(x: f32, ground_y: f32, jump_vel: f32, gravity: f32) -> Self {
        let mut dino = Self {
            x,
            y: ground_y,
            vy: 0.0,
            on_ground: true,
            ducking: false,
            ground_y,
            jump_vel,
            gravity,
            anim_frame: 0,
            anim_timer: 0.0,
            hitbox: Rect::default(),
        };
        dino.hitbox = dino.compute_hitbox();
        dino
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn vy(&self) -> f32 {
        self.vy
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn is_ducking(&self) -> bool {
        self.ducking
    }

    pub fn ground_y(&self) -> f32 {
        self.ground_y
    }

    pub fn anim_frame(&self) -> u8 {
        self.anim_frame
    }

    pub fn hitbox(&self) -> Rect {
        self.hitbox
    }

    /// Full sprite rectangle at the current position
    pub fn sprite_rect(&self) -> Rect {
        Rect::at(self.x, self.y, self.sprite_size())
    }

    pub fn sprite_size(&self) -> Size {
        if !self.on_ground {
            DINO_JUMP
        } else if self.ducking {
            DINO_DUCK
        } else {
            DINO_RUN
        }
    }

    pub fn jump(&mut self) {
        if self.on_ground && !self.ducking {
            self.vy = self.jump_vel;
            self.on_ground = false;
        }
    }

    pub fn duck(&mut self) {
        if self.on_ground {
            self.ducking = true;
            self.y = self.ground_y + DUCK_OFFSET_Y;
        }
    }

    pub fn stand(&mut self) {
        if self.ducking {
            self.ducking = false;
            if self.on_ground {
                self.y = self.ground_y;
            }
        }
    }

    pub fn update(&mut self, dt: f32) {
        let k = frame_factor(dt);
        if !self.on_ground {
            self.ducking = false;
            self.vy += self.gravity * k;
            self.y += self.vy * k;
            if self.y >= self.ground_y {
                self.y = self.ground_y;
                self.vy = 0.0;
                self.on_ground = true;
            }
        }

        if self.on_ground {
            self.anim_timer += dt;
            if self.anim_timer >= DINO_ANIMATION_INTERVAL {
                self.anim_timer = 0.0;
                self.anim_frame = 1 - self.anim_frame;
            }
        }

        self.hitbox = self.compute_hitbox();
    }

    fn compute_hitbox(&self) -> Rect {
        self.sprite_rect()
            .inset_bottom_aligned(DINO_HITBOX_INSET.0, DINO_HITBOX_INSET.1)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::environment::dino::sprites::{DINO_X, GROUND_Y};

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn dino() -> Dino {
        Dino::new(DINO_X, GROUND_Y, -19.2, 0.8)
    }

    #[test]
    fn test_jump_and_land() {
        let mut dino = dino();
        dino.jump();
        assert!(!dino.on_ground());
        assert_eq!(dino.vy(), -19.2);

        let mut ticks = 0;
        let mut highest = dino.y();
        while !dino.on_ground() {
            dino.update(DT);
            highest = highest.min(dino.y());
            ticks += 1;
            assert!(ticks < 200, "dino never landed");
        }
        assert_eq!(dino.y(), GROUND_Y);
        assert_eq!(dino.vy(), 0.0);
        assert!(highest < GROUND_Y - 200.0);
    }

    #[test]
    fn test_no_jump_while_airborne_or_ducking() {
        let mut dino = dino();
        dino.duck();
        dino.jump();
        assert!(dino.on_ground());

        dino.stand();
        dino.jump();
        dino.update(DT);
        let vy = dino.vy();
        dino.jump();
        assert_eq!(dino.vy(), vy);
    }

    #[test]
    fn test_duck_only_on_ground() {
        let mut dino = dino();
        dino.duck();
        assert!(dino.is_ducking());
        assert_eq!(dino.y(), GROUND_Y + DUCK_OFFSET_Y);
        dino.stand();
        assert!(!dino.is_ducking());
        assert_eq!(dino.y(), GROUND_Y);

        dino.jump();
        dino.update(DT);
        dino.duck();
        assert!(!dino.is_ducking());
    }

    #[test]
    fn test_never_airborne_and_ducking() {
        let mut dino = dino();
        for tick in 0..300 {
            match tick % 7 {
                0 => dino.jump(),
                1 | 2 => dino.duck(),
                _ => dino.stand(),
            }
            dino.update(DT);
            assert!(dino.on_ground() || !dino.is_ducking());
        }
    }

    #[rstest]
    #[case(1.0 / 60.0)]
    #[case(1.0 / 30.0)]
    #[case(0.5)]
    fn test_frame_factor_caps_gravity_step(#[case] dt: f32) {
        let mut dino = dino();
        dino.jump();
        dino.update(dt);
        // never more than one 60 fps frame of integration
        assert!((dino.vy() - (-19.2 + 0.8)).abs() < 1e-5);
    }

    #[test]
    fn test_hitbox_is_bottom_aligned_inset() {
        let mut dino = dino();
        dino.update(DT);
        let sprite = dino.sprite_rect();
        let hitbox = dino.hitbox();
        assert_eq!(hitbox.bottom(), sprite.bottom());
        assert_eq!(hitbox.w, DINO_RUN.0 - 20);
        assert_eq!(hitbox.h, DINO_RUN.1 - 10);

        dino.duck();
        dino.update(DT);
        assert_eq!(dino.hitbox().h, DINO_DUCK.1 - 10);
        assert_eq!(dino.hitbox().bottom(), (GROUND_Y + DUCK_OFFSET_Y) as i32 + DINO_DUCK.1);
    }

    #[test]
    fn test_run_animation_toggles() {
        let mut dino = dino();
        assert_eq!(dino.anim_frame(), 0);
        for _ in 0..7 {
            dino.update(DT);
        }
        assert_eq!(dino.anim_frame(), 1);
    }
}
