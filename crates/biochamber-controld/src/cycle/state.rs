//! Active profile handle

use std::sync::Arc;

use biochamber_common::{Preset, Profile, Result};
use parking_lot::RwLock;
use tracing::info;

/// Shared, replaceable active profile
///
/// Writers swap the whole `Arc`; a cycle takes one snapshot at its start so
/// an operator change is picked up by the next cycle, never halfway through.
#[derive(Debug, Clone)]
pub struct ProfileHandle {
    inner: Arc<RwLock<Arc<Profile>>>,
}

impl ProfileHandle {
    pub fn new(profile: Profile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(profile))),
        }
    }

    /// Consistent view of the active profile
    pub fn snapshot(&self) -> Arc<Profile> {
        self.inner.read().clone()
    }

    /// Replace the active profile after validating it
    pub fn replace(&self, profile: Profile) -> Result<Arc<Profile>> {
        profile.validate()?;
        let profile = Arc::new(profile);
        let previous = std::mem::replace(&mut *self.inner.write(), profile.clone());
        info!(from = %previous, to = %profile, "Active profile replaced");
        Ok(profile)
    }

    /// Activate a built-in preset
    pub fn select(&self, preset: Preset) -> Arc<Profile> {
        let profile = Arc::new(preset.profile());
        *self.inner.write() = profile.clone();
        info!(profile = %profile, "Preset selected");
        profile
    }
}

impl Default for ProfileHandle {
    fn default() -> Self {
        Self::new(Profile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_survives_replacement() {
        let handle = ProfileHandle::default();
        let before = handle.snapshot();

        handle.select(Preset::Yeast);
        assert_eq!(before.name, "E. coli");
        assert_eq!(handle.snapshot().target_temperature, 30.0);
    }

    #[test]
    fn test_replace_validates() {
        let handle = ProfileHandle::default();
        let bad = Profile {
            target_ph: 14.5,
            ..Profile::e_coli()
        };
        assert!(handle.replace(bad).is_err());
        assert_eq!(*handle.snapshot(), Profile::e_coli());

        let custom = Profile::custom(32.0, 6.8, 35.0).unwrap();
        handle.replace(custom.clone()).unwrap();
        assert_eq!(*handle.snapshot(), custom);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = ProfileHandle::default();
        let other = handle.clone();
        other.select(Preset::Yeast);
        assert_eq!(handle.snapshot().name, Preset::Yeast.display_name());
    }
}
