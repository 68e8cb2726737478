#![deny(dead_code)]
#![deny(unused_imports)]

pub mod batch;
pub mod http;
pub mod predict;

#[path = "../features/mod.rs"]
pub mod features;

#[path = "../model/mod.rs"]
pub mod model;

#[path = "../shared/config.rs"]
pub mod config;
