pub mod s3_client;

pub use s3_client::{S3Config, S3ObjectStore};
