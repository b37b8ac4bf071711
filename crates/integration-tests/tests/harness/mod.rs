#![allow(dead_code)]

pub mod config;
pub mod images;
pub mod mock_google;
pub mod server;
