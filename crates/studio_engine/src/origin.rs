use std::sync::atomic::{AtomicBool, Ordering};

use studio_core::{resolve_primary_origin, strip_trailing_slashes, OriginConfig, OriginSlot};
use url::Url;

/// Primary and backup origins for one session, plus which one is live.
#[derive(Debug)]
pub struct OriginPool {
    primary: String,
    backup: Option<String>,
    on_backup: AtomicBool,
}

impl OriginPool {
    pub fn new(primary: impl Into<String>, backup: Option<String>) -> Self {
        let primary = strip_trailing_slashes(&primary.into()).to_string();
        let backup = backup
            .map(|origin| strip_trailing_slashes(&origin).to_string())
            .filter(|origin| !origin.is_empty() && *origin != primary);
        Self {
            primary,
            backup,
            on_backup: AtomicBool::new(false),
        }
    }

    /// Resolves the primary origin from the page location.
    pub fn from_page(page: &Url, config: &OriginConfig) -> Self {
        Self::new(
            resolve_primary_origin(page, config),
            Some(config.backup_origin.clone()),
        )
    }

    pub fn slot(&self) -> OriginSlot {
        if self.on_backup.load(Ordering::Acquire) {
            OriginSlot::Backup
        } else {
            OriginSlot::Primary
        }
    }

    pub fn active(&self) -> &str {
        self.origin_for(self.slot())
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn backup(&self) -> Option<&str> {
        self.backup.as_deref()
    }

    pub(crate) fn origin_for(&self, slot: OriginSlot) -> &str {
        match (slot, self.backup.as_deref()) {
            (OriginSlot::Backup, Some(backup)) => backup,
            _ => &self.primary,
        }
    }

    /// Switches the session to the backup origin. Returns `true` only for the
    /// call that performed the switch.
    pub(crate) fn commit_backup(&self) -> bool {
        if self.backup.is_none() {
            return false;
        }
        let mut slot = self.slot();
        if !slot.fail_over() {
            return false;
        }
        self.on_backup
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_identical_to_primary_is_dropped() {
        let pool = OriginPool::new("https://a.test/", Some("https://a.test".to_string()));
        assert_eq!(pool.backup(), None);
        assert!(!pool.commit_backup());
        assert_eq!(pool.active(), "https://a.test");
    }

    #[test]
    fn commit_happens_once() {
        let pool = OriginPool::new("https://a.test", Some("https://b.test/".to_string()));
        assert_eq!(pool.slot(), OriginSlot::Primary);
        assert!(pool.commit_backup());
        assert!(!pool.commit_backup());
        assert_eq!(pool.slot(), OriginSlot::Backup);
        assert_eq!(pool.active(), "https://b.test");
    }

    #[test]
    fn page_resolution_feeds_primary() {
        let page = Url::parse("https://localhost:8443/tool-studio.html").unwrap();
        let pool = OriginPool::from_page(&page, &OriginConfig::default());
        assert_eq!(pool.primary(), "https://localhost:8450");
        assert_eq!(pool.backup(), Some(studio_core::BACKUP_ORIGIN));
    }
}
