// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Demo support for `groupcache-datadog-demo`
//!
//! A simulated groupcache workspace, a query loop that drives traffic through
//! it, and the TOML configuration of the demo binary.

pub mod config;
pub mod demo;
pub mod simulated;

pub use config::{DemoConfig, DemoConfigError, DemoSettings};
pub use demo::{query, query_loop, shutdown_signal, DEFAULT_REPEAT_KEY};
pub use simulated::{SimulatedGroup, SimulatedWorkspace};
