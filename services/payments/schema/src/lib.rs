//! sea-orm entities owned by the payments service.

pub mod attendance_records;
pub mod events;
pub mod payments;
pub mod registrations;
pub mod students;
