pub mod check;
pub mod create_user;
pub mod import;
pub mod run;
