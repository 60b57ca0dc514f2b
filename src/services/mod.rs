pub mod aws;
pub mod bucket_service;
pub mod bundle_service;
pub mod cdn;
pub mod distribution_service;
pub mod manifest_service;
#[cfg(test)]
pub mod memory_store;
pub mod object_store;
pub mod retention_service;
pub mod upload_service;
