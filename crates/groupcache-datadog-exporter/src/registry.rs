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
//! Resolution of the groups polled on each export cycle.

use std::fmt;
use std::sync::Arc;

use crate::stats::StatsSource;

/// Callback listing the groups alive right now.
pub type ListGroups = Arc<dyn Fn() -> Vec<Arc<dyn StatsSource>> + Send + Sync>;

/// Set of groups to export.
///
/// A static registry captures its sources once. A dynamic registry calls back
/// into the cache on every cycle, so groups created or dropped while the
/// process runs are picked up without restarting the exporter.
#[derive(Clone)]
pub enum GroupRegistry {
    /// Fixed list of groups
    Static(Vec<Arc<dyn StatsSource>>),
    /// Groups looked up on every cycle
    Dynamic(ListGroups),
}

impl GroupRegistry {
    /// Registry over a fixed list of groups
    pub fn fixed(groups: Vec<Arc<dyn StatsSource>>) -> Self {
        GroupRegistry::Static(groups)
    }

    /// Registry that re-lists groups through `list` on every cycle
    pub fn dynamic<F>(list: F) -> Self
    where
        F: Fn() -> Vec<Arc<dyn StatsSource>> + Send + Sync + 'static,
    {
        GroupRegistry::Dynamic(Arc::new(list))
    }

    /// Groups to poll this cycle, in poll order. May be empty.
    pub fn current_groups(&self) -> Vec<Arc<dyn StatsSource>> {
        match self {
            GroupRegistry::Static(groups) => groups.clone(),
            GroupRegistry::Dynamic(list) => list(),
        }
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        GroupRegistry::Static(Vec::new())
    }
}

impl fmt::Debug for GroupRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupRegistry::Static(groups) => f
                .debug_tuple("Static")
                .field(&groups.iter().map(|g| g.name()).collect::<Vec<_>>())
                .finish(),
            GroupRegistry::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}
