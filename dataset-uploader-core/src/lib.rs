#![doc = "dataset-uploader-core: core logic library for dataset-uploader."]

//! This crate contains the data model, collaborator traits and the
//! validate → upload → announce pipeline for dataset-uploader.
//! Concrete object-store and broker clients live in the CLI crate.
//!
//! # Usage
//! Add this as a dependency for all pipeline, validation and upload code.

pub mod bucket;
pub mod config;
pub mod contract;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod schema;
pub mod upload;
