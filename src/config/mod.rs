pub mod layout;
pub mod loader;
pub mod types;
pub mod validator;

pub use layout::*;
pub use loader::*;
pub use types::*;
pub use validator::*;
