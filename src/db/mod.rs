// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod contact_repository;
pub mod dynamic_field_repository;
pub mod inquiry_repository;
pub mod media_repository;
pub mod property_repository;
pub mod user_repository;
pub mod user_type_repository;

pub use contact_repository::*;
pub use dynamic_field_repository::*;
pub use inquiry_repository::*;
pub use media_repository::*;
pub use property_repository::*;
pub use user_repository::*;
pub use user_type_repository::*;
