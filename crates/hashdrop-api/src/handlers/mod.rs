pub mod admin;
pub mod audit;
pub mod download;
pub mod health;
pub mod upload;
pub mod verify;
