pub mod contact;
pub mod users;
