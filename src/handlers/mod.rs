//! One handler per CLI command. Handlers log operator-facing progress and
//! delegate the work to `services`.

pub mod clean;
pub mod env;
pub mod upload;
