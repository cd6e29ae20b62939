pub mod albums;
pub mod clear;
pub mod config;
pub mod context;
pub mod display;
pub mod items;
pub mod list;
pub mod pick;
pub mod prompts;
pub mod search;
pub mod stats;
pub mod transfer;
