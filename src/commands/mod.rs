pub mod check;
pub mod find;
pub mod fix;
pub mod init;
pub mod value;
