// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

pub mod account;
pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod ipc;
pub mod service;
pub mod store;
