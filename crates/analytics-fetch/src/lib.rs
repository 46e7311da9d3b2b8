//! Log retrieval for the analytics pipeline.
//!
//! Two interchangeable [`Retriever`] sources produce raw text blobs that are
//! normalized into one JSON object per line:
//!
//! * [`drive::DriveRetriever`] lists and downloads every file in a Google
//!   Drive folder, skipping items that fail.
//! * [`http::UrlRetriever`] issues one GET and fails the run on any error.

pub mod credentials;
pub mod drive;
pub mod http;
pub mod retriever;

pub use retriever::{retrieve_to_file, FetchedBlob, RetrievalSummary, Retriever};
