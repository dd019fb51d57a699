use std::collections::BTreeSet;
use std::fmt;

/// Marks a channel operator in a names reply
pub const PRIVILEGE_MARKER: char = '@';

/// Nicknames holding operator privilege in the primary channel.
///
/// Always rebuilt from a complete names listing, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    members: BTreeSet<String>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from a space-separated names listing such as
    /// `@Alice Bob @Carol`. Only marked names are kept, without the marker.
    pub fn from_names(names: &str) -> Self {
        let mut roster = Self::new();
        roster.extend_from_names(names);
        roster
    }

    pub fn extend_from_names(&mut self, names: &str) {
        let privileged = names
            .split_whitespace()
            .filter_map(|name| name.strip_prefix(PRIVILEGE_MARKER))
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        self.members.extend(privileged);
    }

    pub fn contains(&self, nick: &str) -> bool {
        self.members.contains(nick)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        write!(f, "{}", names.join(", "))
    }
}
