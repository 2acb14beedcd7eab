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
//! Tag construction.
//!
//! Tags are plain `key:value` strings. Static tags are attached once to the
//! DogStatsD client; per-metric tags identify the group, the host and, for
//! cache metrics, the partition.

use std::ffi::OsString;
use std::io;
use tracing::{debug, warn};

use crate::stats::CacheType;

/// Merge the `service:<name>` tag into `tags`, then sort and drop duplicates.
///
/// Sorting happens before deduplication so only adjacent duplicates need to be
/// removed; the output is deterministic for any input order.
pub fn merge_static_tags(mut tags: Vec<String>, service: &str) -> Vec<String> {
    tags.push(format!("service:{}", service));
    tags.sort();
    tags.dedup();
    tags
}

/// Tags shared by every metric of one group.
pub fn group_tags(group: &str, hostname_tag: Option<&str>) -> Vec<String> {
    let mut tags = Vec::with_capacity(3);
    tags.push(format!("group:{}", group));
    if let Some(tag) = hostname_tag {
        tags.push(tag.to_string());
    }
    tags
}

/// Group tags extended with the `type:` tag of a cache partition.
pub fn cache_type_tags(group_tags: &[String], cache_type: CacheType) -> Vec<String> {
    let mut tags = Vec::with_capacity(group_tags.len() + 1);
    tags.extend_from_slice(group_tags);
    tags.push(format!("type:{}", cache_type.as_label()));
    tags
}

/// Build the `<key>:<hostname>` tag from the local host name.
///
/// Returns `None` when disabled or when the lookup fails; a failure is logged
/// and export carries on without the tag.
pub fn hostname_tag(key: &str, disabled: bool) -> Option<String> {
    if disabled {
        debug!("Hostname tag disabled");
        return None;
    }
    hostname_tag_with(key, hostname::get)
}

pub(crate) fn hostname_tag_with<F>(key: &str, lookup: F) -> Option<String>
where
    F: FnOnce() -> io::Result<OsString>,
{
    match lookup() {
        Ok(name) => {
            let name = name.to_string_lossy();
            if name.is_empty() {
                warn!(tag_key = key, "Empty hostname, exporting without hostname tag");
                return None;
            }
            Some(format!("{}:{}", key, name))
        }
        Err(e) => {
            warn!(tag_key = key, error = %e, "Hostname lookup failed, exporting without hostname tag");
            None
        }
    }
}
