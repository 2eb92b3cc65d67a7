pub mod attendance;
pub mod notify;
pub mod order;
pub mod payment;
pub mod verify;
