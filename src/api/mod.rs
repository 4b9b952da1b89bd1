pub mod attendance;
pub mod class;
pub mod classroom;
pub mod export;
pub mod health;
pub mod student;

#[cfg(test)]
mod tests;
