pub mod controllers;
pub mod repository;
