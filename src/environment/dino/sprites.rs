//! Sprite dimensions (width, height) in world pixels and the fixed world positions derived from them.

pub type Size = (i32, i32);

/// Dino x position, fixed for the whole episode
pub const DINO_X: f32 = 80.0;
/// Standing dino top y while on the ground
pub const GROUND_Y: f32 = 310.0;
/// A ducking dino sits lower by this amount
pub const DUCK_OFFSET_Y: f32 = 30.0;

pub const DINO_RUN: Size = (88, 94);
pub const DINO_JUMP: Size = (88, 94);
pub const DINO_DUCK: Size = (118, 60);

/// Dino hitbox inset: total width and height reduction
pub const DINO_HITBOX_INSET: Size = (20, 10);

pub const LARGE_CACTUS: [Size; 3] = [(48, 95), (99, 95), (102, 95)];
pub const SMALL_CACTUS: [Size; 3] = [(40, 71), (68, 71), (105, 71)];

pub const LARGE_CACTUS_Y: f32 = 300.0;
pub const SMALL_CACTUS_Y: f32 = 325.0;

/// Large cacti at least this wide get the most permissive hitbox
pub const WIDE_CACTUS_MIN_WIDTH: i32 = 75;
pub const WIDE_CACTUS_SHRINK: i32 = 30;
pub const LARGE_CACTUS_SHRINK: i32 = 13;
pub const SMALL_CACTUS_SHRINK: i32 = 0;

pub const BIRD: Size = (97, 68);
/// high (pass under), mid (duck), low (jump)
pub const BIRD_HEIGHTS: [f32; 3] = [200.0, 280.0, 340.0];
pub const BIRD_SHRINK: i32 = 20;

pub const BONUS_SIZE: i32 = 32;
/// Bonus top y relative to the dino ground level: reachable standing or only by jumping
pub const BONUS_LOW_OFFSET: f32 = 20.0;
pub const BONUS_HIGH_OFFSET: f32 = 120.0;

pub const CLOUD: Size = (84, 27);

/// seconds between two animation frames
pub const DINO_ANIMATION_INTERVAL: f32 = 0.1;
pub const BIRD_ANIMATION_INTERVAL: f32 = 0.15;
