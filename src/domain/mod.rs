pub mod airport;
pub mod ferry;
pub mod road;
pub mod types;

pub use airport::*;
pub use ferry::*;
pub use road::*;
pub use types::*;
