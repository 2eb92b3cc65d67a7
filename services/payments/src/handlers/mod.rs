pub mod attendance;
pub mod health;
pub mod order;
pub mod verify;
