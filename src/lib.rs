//! Client for the employee self-service backend: login, attendance
//! check-in/check-out, leave requests, and monthly recaps.

pub mod api;
pub mod commands;
pub mod config;
pub mod period;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;
