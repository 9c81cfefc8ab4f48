pub mod dino;
pub mod dino_environment;
