pub mod model;
pub mod q_network;
