// src/lib.rs

//! topicwatch library

pub mod error;
pub mod messaging;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
