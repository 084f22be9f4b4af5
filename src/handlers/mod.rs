pub mod contact;
pub mod health;

pub use contact::*;
pub use health::*;
