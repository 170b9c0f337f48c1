pub mod config;
pub mod discover;
pub mod status;
pub mod works;

pub use discover::run_discover;
pub use status::show_status;
pub use works::list_works;
