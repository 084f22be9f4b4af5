// Re-export all model types
pub use self::contact::*;
pub use self::errors::*;

mod contact;
mod errors;
