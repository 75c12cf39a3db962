pub mod catalog;
pub mod init;
pub mod next;
pub mod refs;
pub mod serve;
pub mod state;
