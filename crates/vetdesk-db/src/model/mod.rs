pub mod appointment;
pub mod customer;
pub mod pet;
pub mod user;
