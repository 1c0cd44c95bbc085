pub mod types;

pub use types::TroupeError;
