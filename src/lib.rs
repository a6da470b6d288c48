pub mod activation;
pub mod config;
pub mod debounce;
pub mod error;
pub mod host;
pub mod matcher;
pub mod observer;
pub mod render;
pub mod typeset;
pub mod wrap;
