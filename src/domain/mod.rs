// Domain layer: value objects and ports. No I/O beyond the trait seams.

pub mod model;
pub mod ports;
