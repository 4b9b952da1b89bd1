pub mod attendance;
pub mod class;
pub mod classroom;
pub mod enrollment;
pub mod record;
pub mod student;
