
mod rands;

pub use rands::*;
