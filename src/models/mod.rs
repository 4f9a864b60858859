pub mod featured;
pub mod gallery;
pub mod instagram;
pub mod message;
pub mod phone;
pub mod post;
pub mod review;
pub mod settings;
pub mod user;
