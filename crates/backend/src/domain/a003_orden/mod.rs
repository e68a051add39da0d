pub mod items;
pub mod reconciler;
pub mod repository;
pub mod service;
