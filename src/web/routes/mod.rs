pub mod activities;
pub mod auth;
pub mod comments;
pub mod registrations;
