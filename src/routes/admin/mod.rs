pub mod merchants;
pub mod riders;
pub mod users;
