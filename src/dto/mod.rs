pub mod admin;
pub mod auth;
pub mod cart;
pub mod commands;
pub mod contact;
pub mod products;
pub mod reservations;
