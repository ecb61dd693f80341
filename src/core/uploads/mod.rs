pub mod upload_models;
pub mod upload_service;

pub use upload_models::{
    ObjectMetadata, PresignedGrant, UploadReceipt, UploadRequest, UploadResult,
};
pub use upload_service::{check_upload, ObjectStore, UploadError, UploadService};
