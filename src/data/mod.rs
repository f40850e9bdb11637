pub mod context;
pub mod jokes;
pub mod snapshot;
pub mod weather;
