pub mod commit;
pub mod repository;
pub mod signature;
pub mod token;
pub mod types;
