pub mod algebra_2d;
pub mod cloud;
pub mod console_drawer;
pub mod dino;
pub mod obstacle;
pub mod spawner;
pub mod sprites;
pub mod world;

/// Frame-normalization factor: one nominal 60 fps frame per tick at most, however long `dt` was
pub fn frame_factor(dt: f32) -> f32 {
    (dt * 60.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1.0 / 60.0, 1.0)]
    #[case(1.0 / 120.0, 0.5)]
    #[case(0.25, 1.0)]
    #[case(0.0, 0.0)]
    fn test_frame_factor(#[case] dt: f32, #[case] expected: f32) {
        assert!((frame_factor(dt) - expected).abs() < 1e-6);
    }
}
