pub mod base;
pub mod cache;
pub mod clients;
pub mod download;
pub mod logging;

pub use base::*;
pub use cache::*;
pub use clients::*;
pub use download::*;
pub use logging::*;
