//! Object storage adapter

mod uploader;

pub use uploader::{object_path, StorageUploader};
