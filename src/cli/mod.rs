pub mod advance;
pub mod import;
pub mod init;
pub mod orders;
pub mod serve;
