//! Core data models for the bucket browser.
//!
//! `object` holds what the store reports, `entry` holds the virtual folder
//! view built on top of it, `page` holds listing presentation helpers.

pub mod entry;
pub mod object;
pub mod page;
