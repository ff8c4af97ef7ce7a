pub mod init;
pub mod install;
pub mod remove;
pub mod render;
pub mod status;
