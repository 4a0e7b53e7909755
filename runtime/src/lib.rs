// Copyright 2026 Quizchain Contributors
// SPDX-License-Identifier: MIT

//! Quizchain runtime: concrete capabilities and the process shell around
//! the `quizchain` engine.
//!
//! This library crate exposes the modules for integration testing.

pub mod cli;
pub mod config;
pub mod http_client;
pub mod keepalive;
pub mod refiner;
pub mod renderer;
pub mod rest;
