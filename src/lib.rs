#![forbid(unsafe_code)]

pub mod api;
pub mod bench;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod formats;
pub mod ids;
pub mod inspect;
pub mod logging;
pub mod parser;
pub mod retry;
pub mod run;
pub mod storage;
pub mod toc;
