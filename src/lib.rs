//! EatMate - recipe discovery, nutrition lookup and cooking assistant client.
//!
//! Features:
//! - Ingredient, nutrient and free-text recipe search over one session controller
//! - Recipe detail with instruction, ingredient and nutrition views
//! - Ingredient substitute lookup
//! - Conversational cooking assistant
//! - Light/dark/system theme preference

pub mod completion;
pub mod config;
pub mod conversation;
pub mod detail;
pub mod error;
pub mod http;
pub mod logger;
pub mod models;
pub mod query;
pub mod recipe_api;
pub mod screen;
pub mod search;
pub mod substitutes;
pub mod theme;

pub use error::EatMateError;
