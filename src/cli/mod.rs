pub mod app;
pub mod summary;

pub use app::Cli;
