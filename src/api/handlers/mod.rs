pub mod awards;
pub mod health;
pub mod types;
