//! Match lobby - creation, joining and per-request match access

pub mod service;

pub use service::LobbyService;
