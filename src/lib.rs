pub mod app;
pub mod cli;
pub mod drive;
pub mod logging;
pub mod paths;
pub mod server;
pub mod session;
pub mod settings;
pub mod storage;
pub mod store;
pub mod theme;
pub mod types;
pub mod view;
