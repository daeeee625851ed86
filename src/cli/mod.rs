pub mod detail;
pub mod list;
pub mod setup;
pub mod ui;
