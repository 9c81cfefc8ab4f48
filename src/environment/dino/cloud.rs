use crate::environment::dino::frame_factor;
use crate::environment::dino::sprites::CLOUD;

/// Background decoration, drifting at half the world speed
#[derive(Clone, Debug, PartialEq)]
pub struct Cloud {
    pub x: f32,
    pub y: f32,
}

impl Cloud {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn update(&mut self, speed: f32, dt: f32) {
        self.x -= speed * frame_factor(dt) * 0.5;
    }

    pub fn offscreen(&self) -> bool {
        self.x < -(CLOUD.0 as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_speed_drift() {
        let mut cloud = Cloud::new(100.0, 60.0);
        cloud.update(10.0, 1.0 / 60.0);
        assert_eq!(cloud.x, 95.0);
        assert_eq!(cloud.y, 60.0);
    }

    #[test]
    fn test_offscreen() {
        assert!(!Cloud::new(-84.0, 60.0).offscreen());
        assert!(Cloud::new(-84.5, 60.0).offscreen());
    }
}
