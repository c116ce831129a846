pub mod dates;
pub mod filter;
pub mod flatten;
pub mod loader;
pub mod quick_add;
