//! Binds the `User` domain type into the cache framework.

pub mod entity;
