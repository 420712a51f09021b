pub mod config_manager;
pub mod error;
pub mod logging;
pub mod recipe;
pub mod session;

pub use config_manager::*;
pub use error::*;
pub use logging::*;
pub use recipe::*;
pub use session::*;
