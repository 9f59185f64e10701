pub mod application_item;
pub mod item;
pub mod rental_application;
