use std::fmt;
use std::str::FromStr;

pub const FIRST_NAME: &str = "first_name";
pub const LAST_NAME: &str = "last_name";
/// Holds a full document URL despite the column name.
pub const FILE_NAME: &str = "file_name";

/// Canonical column order, identity columns first.
pub const COLUMNS: [&str; 7] = [
    FIRST_NAME,
    LAST_NAME,
    FILE_NAME,
    Flag::Seen.column(),
    Flag::IntendView.column(),
    Flag::CvSaved.column(),
    Flag::Contacted.column(),
];

/// Joins identity parts inside a [`RowKey`]. The normalizer strips it from
/// every identity field, so it can never appear inside one.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// One of the four recruiter actions tracked per candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Seen,
    IntendView,
    CvSaved,
    Contacted,
}

impl Flag {
    pub const ALL: [Flag; 4] = [Flag::Seen, Flag::IntendView, Flag::CvSaved, Flag::Contacted];

    pub const fn column(self) -> &'static str {
        match self {
            Flag::Seen => "seen",
            Flag::IntendView => "intend_view",
            Flag::CvSaved => "cv_saved",
            Flag::Contacted => "contacted",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Flag::ALL
            .into_iter()
            .find(|flag| flag.column() == wanted)
            .ok_or_else(|| format!("unknown flag '{}' (expected one of seen, intend_view, cv_saved, contacted)", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    pub seen: bool,
    pub intend_view: bool,
    pub cv_saved: bool,
    pub contacted: bool,
}

impl Flags {
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Seen => self.seen,
            Flag::IntendView => self.intend_view,
            Flag::CvSaved => self.cv_saved,
            Flag::Contacted => self.contacted,
        }
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::Seen => self.seen = value,
            Flag::IntendView => self.intend_view = value,
            Flag::CvSaved => self.cv_saved = value,
            Flag::Contacted => self.contacted = value,
        }
    }

    pub fn with(mut self, flag: Flag, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    pub fn toggled(self, flag: Flag) -> Self {
        let current = self.get(flag);
        self.with(flag, !current)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Flag, bool)> + '_ {
        Flag::ALL.into_iter().map(|flag| (flag, self.get(flag)))
    }
}

/// Identity of a candidate row across snapshots. Flags are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(String);

impl RowKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Names compare trimmed and case-insensitively. The URL is only trimmed
/// because document links are case-sensitive.
pub fn compute_key(record: &CandidateRecord) -> RowKey {
    let mut key = String::with_capacity(
        record.first_name.len() + record.last_name.len() + record.file_url.len() + 2,
    );
    key.push_str(&record.first_name.trim().to_lowercase());
    key.push(KEY_SEPARATOR);
    key.push_str(&record.last_name.trim().to_lowercase());
    key.push(KEY_SEPARATOR);
    key.push_str(record.file_url.trim());
    RowKey(key)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRecord {
    pub first_name: String,
    pub last_name: String,
    pub file_url: String,
    pub flags: Flags,
}

impl CandidateRecord {
    pub fn new(first_name: &str, last_name: &str, file_url: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            file_url: file_url.to_string(),
            flags: Flags::default(),
        }
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn key(&self) -> RowKey {
        compute_key(self)
    }

    /// Case-insensitive substring match on first or last name.
    pub fn matches_name(&self, needle_lower: &str) -> bool {
        self.first_name.to_lowercase().contains(needle_lower)
            || self.last_name.to_lowercase().contains(needle_lower)
    }
}
