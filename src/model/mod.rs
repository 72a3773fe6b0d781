pub mod changelog;
pub mod component;
pub mod config;
pub mod feed;
pub mod installed;
pub mod lenient;
pub mod phase;
pub mod report;
pub mod selection;
