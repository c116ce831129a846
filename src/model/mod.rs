pub mod config;
pub mod project;
pub mod tag;
pub mod task;
pub mod time_entry;
pub mod view;

pub use config::*;
pub use project::*;
pub use tag::*;
pub use task::*;
pub use time_entry::*;
pub use view::*;
