mod builder;
mod deal_observer;

pub use builder::*;
pub use deal_observer::*;
