pub mod aggregate;
pub mod app;
pub mod feed;
pub mod import;
pub mod path;
pub mod prepare;
pub mod reconcile;
pub mod schedule;
