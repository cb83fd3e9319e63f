pub mod catalog;
pub mod draft;
pub mod hooks;
pub mod identity;
pub mod resolver;
pub mod resolvers;
pub mod state;
pub mod utils;
