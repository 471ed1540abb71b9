//! Temperature sensors

pub mod mlx90614;
