// Domain layer: records, report data and ports (interfaces). No I/O here.

pub mod model;
pub mod ports;
pub mod report;
