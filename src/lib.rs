//! Server-authoritative chess where each player secretly holds one
//! rule-bending advantage.

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod websocket;
