//! Data Architect API - backend for a two-player turn-based data platform
//! simulation, plus the Anchors habit tracker.
//!
//! This crate provides:
//! - Rooms, turn submission and deterministic turn resolution
//! - Live room updates over WebSocket
//! - Habits, daily logs, accountability buddies and milestone notifications
//! - A notification inbox streamed over Server-Sent Events
//! - A single-user offline tracker persisted as a JSON document

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod game;
pub mod hub;
pub mod routes;
pub mod services;
pub mod state;
pub mod tracker;
pub mod utils;
