// Domain layer: listing records, batch results and the ports adapters implement.

pub mod model;
pub mod ports;
