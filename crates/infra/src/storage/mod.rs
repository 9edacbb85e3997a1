//! Blob storage implementations.

mod blob;

pub use blob::LocalBlobStore;
