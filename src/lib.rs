// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

pub mod config;
pub mod message;
pub mod proxy;
pub mod relay;
pub mod upstream;
