//! CLI command implementations.

pub mod id;
pub mod init;
pub mod run;

pub use id::id;
pub use init::init;
pub use run::run;
