// Copyright 2025 Toolbridge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Deterministic cache key construction.

/// Delimiter between key components. Not escaped: an argument value that
/// itself contains `|` can collide with a different argument list. Known
/// limitation, acceptable for the argument shapes the tools produce.
const DELIMITER: &str = "|";

/// Build a cache key from a call identifier plus its arguments.
///
/// Positional arguments contribute in call order; keyword arguments
/// contribute as `name:value` pairs sorted lexicographically by name, so
/// keyword order at the call site never changes the key.
pub fn build_key(identifier: &str, positional: &[&str], keyword: &[(&str, &str)]) -> String {
    let mut parts = Vec::with_capacity(1 + positional.len() + keyword.len());
    parts.push(identifier.to_string());

    for arg in positional {
        parts.push((*arg).to_string());
    }

    let mut sorted: Vec<&(&str, &str)> = keyword.iter().collect();
    sorted.sort_by_key(|(name, _)| *name);
    for (name, value) in sorted {
        parts.push(format!("{name}:{value}"));
    }

    parts.join(DELIMITER)
}
