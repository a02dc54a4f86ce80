use std::str::FromStr;

/// What `ban` does to the target. Exactly one mode is active per
/// deployment; they never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanMode {
    /// Set `is_banned` and retain the user and their history (default).
    Flag,
    /// Remove the user and all their messages outright.
    Delete,
}

impl FromStr for BanMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flag" => Ok(Self::Flag),
            "delete" => Ok(Self::Delete),
            other => Err(anyhow::anyhow!(
                "invalid ban mode '{other}' (expected 'flag' or 'delete')"
            )),
        }
    }
}

/// Whether `clear_room` wipes one room or the entire history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    /// Clear only the named room (default).
    Room,
    /// Clear everything, whichever room was named.
    Global,
}

impl FromStr for ClearScope {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "room" => Ok(Self::Room),
            "global" => Ok(Self::Global),
            other => Err(anyhow::anyhow!(
                "invalid clear scope '{other}' (expected 'room' or 'global')"
            )),
        }
    }
}

/// Deployment-level policy knobs.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Newest messages returned per history page.
    pub page_size: u32,
    pub ban_mode: BanMode,
    pub clear_scope: ClearScope,
    /// Accept posts whose text sanitizes to nothing (image-only posts are
    /// always accepted).
    pub allow_empty: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            page_size: 50,
            ban_mode: BanMode::Flag,
            clear_scope: ClearScope::Room,
            allow_empty: false,
        }
    }
}
