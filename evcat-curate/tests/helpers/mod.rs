//! Shared helpers for evcat-curate integration tests

#![allow(dead_code)]

pub mod db_utils;
pub mod fixtures;
