pub mod add;
pub mod cat;
pub mod db;
pub mod init;
pub mod log;
pub mod ls;
pub mod run;
pub mod show;
pub mod sync;
