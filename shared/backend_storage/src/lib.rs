//! Backend storage services for Filedrop
//!
//! This crate provides storage functionality shared between the API and the
//! notification worker: file metadata records in `DynamoDB` and the upload
//! notification SQS queue.

pub mod file_record;
pub mod queue;
