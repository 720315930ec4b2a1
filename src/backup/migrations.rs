//! Version-gated migrations for backup documents.
//!
//! Each migration is registered against a threshold version. A backup whose
//! declared version is strictly below the threshold gets the migration; a
//! backup at or above it does not. Some migrations rewrite a single field as
//! each record is inserted, others run once after every task is in place.
//!
//! ```ignore
//! let plan = MigrationRegistry::standard().plan(backup.version);
//! if plan.applies(Migration::CommentPictureUris) {
//!     comment.convert_picture_uri();
//! }
//! for step in plan.post_import() {
//!     // run step
//! }
//! ```

use super::palette::ColorPalette;
use std::fmt;

/// App version code as written in backups.
pub type Version = i32;

pub const V6_4: Version = 546;
pub const V8_2: Version = 675;
pub const V9_6: Version = 90600;
pub const V9_7: Version = 90700;

/// When a migration runs relative to the import loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Applied to each affected record just before it is inserted.
    PerRecord,
    /// Applied once after all entities and tasks are imported.
    AfterImport,
}

/// A single data fixup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Migration {
    /// Comment pictures stored as JSON `{uri|path}` become plain URIs.
    CommentPictureUris,
    /// Attachment filesystem paths become `file://` URIs.
    AttachmentPathUris,
    /// Palette indexes on tags, lists, filters and calendars become ARGB.
    LegacyColors,
    /// The theme colour preference index becomes ARGB.
    ThemeColorPreference,
    /// Tasks with no remote association move into the local list.
    MigrateLocalTasks,
}

impl Migration {
    pub fn phase(&self) -> Phase {
        match self {
            Migration::CommentPictureUris
            | Migration::AttachmentPathUris
            | Migration::LegacyColors => Phase::PerRecord,
            Migration::ThemeColorPreference | Migration::MigrateLocalTasks => Phase::AfterImport,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Migration::CommentPictureUris => "convert comment picture references to URIs",
            Migration::AttachmentPathUris => "convert attachment paths to file URIs",
            Migration::LegacyColors => "translate palette indexes to colors",
            Migration::ThemeColorPreference => "translate theme color preference",
            Migration::MigrateLocalTasks => "move local-only tasks into the local list",
        }
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A migration and the first version that no longer needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionGate {
    pub threshold: Version,
    pub migration: Migration,
}

impl VersionGate {
    pub fn applies_to(&self, version: Version) -> bool {
        version < self.threshold
    }
}

/// Ordered list of version gates.
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    gates: Vec<VersionGate>,
}

impl MigrationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The gates every import runs through.
    pub fn standard() -> Self {
        Self::new()
            .register(V6_4, Migration::CommentPictureUris)
            .register(V6_4, Migration::AttachmentPathUris)
            .register(V8_2, Migration::LegacyColors)
            .register(V8_2, Migration::ThemeColorPreference)
            .register(V9_6, Migration::MigrateLocalTasks)
    }

    /// Append a gate. After-import migrations run in registration order.
    pub fn register(mut self, threshold: Version, migration: Migration) -> Self {
        self.gates.push(VersionGate {
            threshold,
            migration,
        });
        self
    }

    pub fn gates(&self) -> &[VersionGate] {
        &self.gates
    }

    /// Resolve which migrations a document at `version` needs.
    pub fn plan(&self, version: Version) -> MigrationPlan {
        let mut applicable = Vec::new();
        for gate in &self.gates {
            if gate.applies_to(version) && !applicable.contains(&gate.migration) {
                applicable.push(gate.migration);
            }
        }
        MigrationPlan {
            version,
            applicable,
        }
    }
}

/// Migrations selected for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    version: Version,
    applicable: Vec<Migration>,
}

impl MigrationPlan {
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn applies(&self, migration: Migration) -> bool {
        self.applicable.contains(&migration)
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.applicable
    }

    /// After-import migrations, in registration order.
    pub fn post_import(&self) -> impl Iterator<Item = Migration> + '_ {
        self.applicable
            .iter()
            .copied()
            .filter(|m| m.phase() == Phase::AfterImport)
    }

    /// Translate a stored colour if this document still uses palette indexes.
    pub fn color(&self, color: i32, palette: &dyn ColorPalette) -> i32 {
        if self.applies(Migration::LegacyColors) {
            palette.android_color(color)
        } else {
            color
        }
    }
}
