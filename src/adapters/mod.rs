// Adapters layer: translate between external formats and the domain model.

pub mod csv_codec;
pub mod trigger;
