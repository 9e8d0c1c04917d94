use std::fmt;

use crate::error::Error;

/// Action to take when an item of the same name already exists at the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistsPolicy {
    #[default]
    Fail,
    Overwrite,
    Rename,
    /// Return the existing folder instead of creating one. Only valid for
    /// folder creation.
    Reuse,
}

impl ExistsPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ExistsPolicy::Fail => "fail",
            ExistsPolicy::Overwrite => "overwrite",
            ExistsPolicy::Rename => "rename",
            ExistsPolicy::Reuse => "reuse",
        }
    }

    /// Move, copy and upload only accept FAIL/OVERWRITE/RENAME.
    pub(crate) fn ensure_transferable(self, operation: &str) -> Result<Self, Error> {
        if self == ExistsPolicy::Reuse {
            return Err(Error::Argument(format!(
                "exists policy REUSE is not valid for {operation}"
            )));
        }
        Ok(self)
    }
}

/// Action to take when a trash restore cannot land at the item's original
/// address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    #[default]
    Fail,
    /// Fall back to a caller-supplied destination folder (default: root).
    Rescue,
    /// Recreate the named destination path hierarchy. Expensive: one listing
    /// call per path segment. Never the default.
    Recreate,
}

impl RestorePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RestorePolicy::Fail => "fail",
            RestorePolicy::Rescue => "rescue",
            RestorePolicy::Recreate => "recreate",
        }
    }
}

/// Action to take when the version held by the client does not match the
/// version on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionConflict {
    #[default]
    Fail,
    Ignore,
}

impl VersionConflict {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionConflict::Fail => "fail",
            VersionConflict::Ignore => "ignore",
        }
    }
}

impl fmt::Display for ExistsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RestorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
