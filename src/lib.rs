pub mod api;
pub mod catalog;
pub mod config;
pub mod datasets;
pub mod error;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod remote;
pub mod scoring;
pub mod service;
