pub mod admin_service;
pub mod cart_service;
pub mod command_service;
pub mod contact_service;
pub mod product_service;
pub mod reservation_service;
pub mod validate;
