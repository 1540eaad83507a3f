use crate::error::FindpassError;
use crate::probe::ToolFlags;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// How a catalog entry takes its value and renders into a `find` fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// No value; the fragment is emitted verbatim (or toggles a flag).
    Boolean,
    /// Free text, escaped and single-quoted into the fragment.
    Text,
    /// A kilobyte count, converted to bytes.
    Number,
    /// "modified less than N days ago".
    TimeBefore,
    /// "modified more than N days ago".
    TimeAfter,
    /// Menu grouping only.
    Separator,
    /// Past the end of the catalog.
    Terminator,
}

/// Catalog entries whose meaning is not a `find` flag at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Toggles hidden/backup files in the result filter.
    HiddenToggle,
    /// Suppresses the default `-xdev`.
    MountExclusion,
}

/// One immutable catalog entry.
///
/// `fragment` uses `%s` for each substituted value. `fragment_nocase` is the
/// variant adopted when the tool probe finds a case-insensitive flag.
#[derive(Debug)]
pub struct ConstraintTemplate {
    pub kind:            ConstraintKind,
    pub fragment:        &'static str,
    pub fragment_nocase: Option<&'static str>,
    pub label:           &'static str,
    pub unit:            Option<&'static str>,
    pub marker:          Option<Marker>,
}

impl ConstraintTemplate {
    pub fn is_hidden_toggle(&self) -> bool {
        self.marker == Some(Marker::HiddenToggle)
    }

    pub fn is_mount_exclusion(&self) -> bool {
        self.marker == Some(Marker::MountExclusion)
    }

    /// The fragment to fill, honouring the probed case-insensitivity.
    fn fragment_for(&self, case_insensitive: bool) -> &'static str {
        match self.fragment_nocase {
            Some(nocase) if case_insensitive => nocase,
            _ => self.fragment,
        }
    }
}

const fn template(
    kind: ConstraintKind,
    fragment: &'static str,
    label: &'static str,
) -> ConstraintTemplate {
    ConstraintTemplate { kind, fragment, fragment_nocase: None, label, unit: None, marker: None }
}

const SEPARATOR: ConstraintTemplate = template(ConstraintKind::Separator, "", "");

/// The selectable constraints, in menu order. Separators group the menu.
pub static CATALOG: [ConstraintTemplate; 19] = [
    ConstraintTemplate {
        fragment_nocase: Some("'!' -type p -exec grep -i -c '%s' {} \\;"),
        ..template(ConstraintKind::Text, "'!' -type p -exec grep -c '%s' {} \\;", "Contains the text")
    },
    SEPARATOR,
    ConstraintTemplate {
        unit: Some("days"),
        ..template(ConstraintKind::TimeBefore, "-mtime -%s", "Date modified less than")
    },
    ConstraintTemplate {
        unit: Some("days"),
        ..template(ConstraintKind::TimeAfter, "\\( -mtime +%s -o -mtime %s \\)", "Date modified more than")
    },
    SEPARATOR,
    ConstraintTemplate {
        unit: Some("kilobytes"),
        ..template(ConstraintKind::Number, "\\( -size %sc -o -size +%sc \\)", "Size at least")
    },
    ConstraintTemplate {
        unit: Some("kilobytes"),
        ..template(ConstraintKind::Number, "\\( -size %sc -o -size -%sc \\)", "Size at most")
    },
    template(ConstraintKind::Boolean, "-size 0c \\( -type f -o -type d \\)", "File is empty"),
    SEPARATOR,
    template(ConstraintKind::Text, "-user '%s'", "Owned by user"),
    template(ConstraintKind::Text, "-group '%s'", "Owned by group"),
    template(ConstraintKind::Boolean, "\\( -nouser -o -nogroup \\)", "Owner is unrecognized"),
    SEPARATOR,
    ConstraintTemplate {
        fragment_nocase: Some("'!' -iname '*%s*'"),
        ..template(ConstraintKind::Text, "'!' -name '*%s*'", "Name does not contain")
    },
    template(ConstraintKind::Text, "-regex '%s'", "Name matches regular expression"),
    SEPARATOR,
    ConstraintTemplate {
        marker: Some(Marker::HiddenToggle),
        ..template(ConstraintKind::Boolean, "SHOW_HIDDEN_FILES", "Show hidden and backup files")
    },
    template(ConstraintKind::Boolean, "-follow", "Follow symbolic links"),
    ConstraintTemplate {
        marker: Some(Marker::MountExclusion),
        ..template(ConstraintKind::Boolean, "INCLUDE_OTHER_FILESYSTEMS", "Include other filesystems")
    },
];

/// Kind of the catalog entry at `index`; `Terminator` past the end.
pub fn kind_at(index: usize) -> ConstraintKind {
    CATALOG.get(index).map(|t| t.kind).unwrap_or(ConstraintKind::Terminator)
}

// ---------------------------------------------------------------------------
// ConstraintId
// ---------------------------------------------------------------------------

/// A selectable (non-separator) catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintId {
    ContainsText,
    ModifiedLessThan,
    ModifiedMoreThan,
    SizeAtLeast,
    SizeAtMost,
    FileIsEmpty,
    OwnedByUser,
    OwnedByGroup,
    OwnerUnrecognized,
    NameExcludes,
    NameMatchesRegex,
    ShowHidden,
    FollowSymlinks,
    IncludeOtherFilesystems,
}

impl ConstraintId {
    /// Every selectable id, in menu order.
    pub const ALL: [ConstraintId; 14] = [
        Self::ContainsText,
        Self::ModifiedLessThan,
        Self::ModifiedMoreThan,
        Self::SizeAtLeast,
        Self::SizeAtMost,
        Self::FileIsEmpty,
        Self::OwnedByUser,
        Self::OwnedByGroup,
        Self::OwnerUnrecognized,
        Self::NameExcludes,
        Self::NameMatchesRegex,
        Self::ShowHidden,
        Self::FollowSymlinks,
        Self::IncludeOtherFilesystems,
    ];

    /// Position in [`CATALOG`].
    pub fn index(self) -> usize {
        match self {
            Self::ContainsText            => 0,
            Self::ModifiedLessThan        => 2,
            Self::ModifiedMoreThan        => 3,
            Self::SizeAtLeast             => 5,
            Self::SizeAtMost              => 6,
            Self::FileIsEmpty             => 7,
            Self::OwnedByUser             => 9,
            Self::OwnedByGroup            => 10,
            Self::OwnerUnrecognized       => 11,
            Self::NameExcludes            => 13,
            Self::NameMatchesRegex        => 14,
            Self::ShowHidden              => 16,
            Self::FollowSymlinks          => 17,
            Self::IncludeOtherFilesystems => 18,
        }
    }

    pub fn template(self) -> &'static ConstraintTemplate {
        &CATALOG[self.index()]
    }

    pub fn kind(self) -> ConstraintKind {
        self.template().kind
    }

    pub fn label(self) -> &'static str {
        self.template().label
    }
}

// ---------------------------------------------------------------------------
// Constraint
// ---------------------------------------------------------------------------

/// The value carried by a non-boolean constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintValue {
    Text(String),
    /// Kilobytes.
    Count(u64),
    /// Days before now.
    Days(u32),
}

/// One selected constraint. The value variant always matches the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    id:    ConstraintId,
    value: Option<ConstraintValue>,
}

/// What a constraint contributes to the composed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendering {
    /// Append this fragment (a trailing space is added by the caller).
    Fragment(String),
    /// Empty text value: treated as not set.
    Skip,
    ShowHidden,
    IncludeOtherFilesystems,
    /// Post-filter base names with this regex instead of composing it.
    Regex(String),
}

impl Constraint {
    /// Build a constraint, rejecting a value of the wrong variant.
    pub fn new(id: ConstraintId, value: Option<ConstraintValue>) -> Result<Self, FindpassError> {
        let ok = matches!(
            (id.kind(), &value),
            (ConstraintKind::Boolean, None)
                | (ConstraintKind::Text, Some(ConstraintValue::Text(_)))
                | (ConstraintKind::Number, Some(ConstraintValue::Count(_)))
                | (ConstraintKind::TimeBefore | ConstraintKind::TimeAfter, Some(ConstraintValue::Days(_)))
        );
        if !ok {
            return Err(FindpassError::InvalidConstraintValue {
                constraint: id.label(),
                reason:     format!("{:?} does not fit a {:?} constraint", value, id.kind()),
            });
        }
        Ok(Self { id, value })
    }

    /// Build a constraint from raw user input.
    ///
    /// Numbers are read the way `sscanf("%d")` reads them: a leading integer,
    /// trailing junk ignored, `0` when nothing parses.
    pub fn parse(id: ConstraintId, raw: &str) -> Self {
        let value = match id.kind() {
            ConstraintKind::Text => Some(ConstraintValue::Text(raw.to_string())),
            ConstraintKind::Number => Some(ConstraintValue::Count(leading_int(raw).max(0) as u64)),
            ConstraintKind::TimeBefore | ConstraintKind::TimeAfter => {
                Some(ConstraintValue::Days(leading_int(raw).clamp(0, u32::MAX as i64) as u32))
            }
            _ => None,
        };
        Self { id, value }
    }

    /// A boolean constraint.
    pub fn flag(id: ConstraintId) -> Self {
        Self::parse(id, "")
    }

    pub fn id(&self) -> ConstraintId {
        self.id
    }

    pub fn value(&self) -> Option<&ConstraintValue> {
        self.value.as_ref()
    }

    /// Text value, if this is a text constraint.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Some(ConstraintValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    /// Whether this constraint changes the search at all. Empty text does not.
    pub fn is_set(&self) -> bool {
        match &self.value {
            Some(ConstraintValue::Text(t)) => !t.trim().is_empty(),
            _ => true,
        }
    }

    /// Render into a `find` fragment (or a side-channel effect).
    pub fn render(&self, flags: &ToolFlags) -> Rendering {
        let template = self.id.template();
        match &self.value {
            None => match template.marker {
                Some(Marker::HiddenToggle)   => Rendering::ShowHidden,
                Some(Marker::MountExclusion) => Rendering::IncludeOtherFilesystems,
                None => Rendering::Fragment(template.fragment.to_string()),
            },
            Some(ConstraintValue::Text(_)) if !self.is_set() => Rendering::Skip,
            Some(ConstraintValue::Text(text)) => {
                if self.id == ConstraintId::NameMatchesRegex {
                    return Rendering::Regex(text.clone());
                }
                let nocase = match self.id {
                    ConstraintId::ContainsText => flags.grep_ignore_case,
                    ConstraintId::NameExcludes => flags.find_iname,
                    _ => false,
                };
                let escaped = crate::command::escape_for_single_quotes(text);
                Rendering::Fragment(fill(template.fragment_for(nocase), &escaped))
            }
            Some(ConstraintValue::Count(kb)) => {
                let bytes = kb.saturating_mul(1024).to_string();
                Rendering::Fragment(fill(template.fragment, &bytes))
            }
            Some(ConstraintValue::Days(days)) => {
                Rendering::Fragment(fill(template.fragment, &days.to_string()))
            }
        }
    }
}

/// Substitute every `%s` in `fragment` with `value`.
fn fill(fragment: &str, value: &str) -> String {
    fragment.replace("%s", value)
}

/// Leading (optionally signed) integer of `raw`, after leading whitespace.
fn leading_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// ConstraintSet
// ---------------------------------------------------------------------------

/// The user's active constraints, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    items: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint. Each template is selected at most once: re-adding
    /// one replaces its value and keeps its position.
    pub fn add(&mut self, constraint: Constraint) {
        match self.items.iter_mut().find(|c| c.id == constraint.id) {
            Some(existing) => *existing = constraint,
            None => self.items.push(constraint),
        }
    }

    pub fn remove(&mut self, id: ConstraintId) -> Option<Constraint> {
        let pos = self.items.iter().position(|c| c.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn is_selected(&self, id: ConstraintId) -> bool {
        self.items.iter().any(|c| c.id == id)
    }

    /// First catalog entry not selected yet, for the "add constraint" menu.
    pub fn next_available(&self) -> Option<ConstraintId> {
        ConstraintId::ALL.into_iter().find(|id| !self.is_selected(*id))
    }

    /// Whether any constraint actually narrows the search.
    pub fn has_additional_constraints(&self) -> bool {
        self.items.iter().any(Constraint::is_set)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut set = Self::new();
        for c in iter {
            set.add(c);
        }
        set
    }
}
