pub mod time_utils;

pub use time_utils::{hour_bucket, window_start};
