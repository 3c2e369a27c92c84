// Domain layer: core models, the green-time policy and ports (interfaces).

pub mod model;
pub mod policy;
pub mod ports;
