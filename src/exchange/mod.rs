pub mod traits;
pub mod types;

pub mod signing;

pub mod apex;
