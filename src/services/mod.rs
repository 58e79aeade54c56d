pub mod cleanup;
pub mod error;
pub mod persistence;
pub mod pipeline;
pub mod registry;
pub mod remote;
pub mod s3_store;
pub mod staging;
pub mod sweeper;
pub mod upload_service;
