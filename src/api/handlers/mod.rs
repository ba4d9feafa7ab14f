pub mod admin;
pub mod health;
pub mod login;
pub mod me;
pub mod password;
pub mod register;
pub mod verification;
