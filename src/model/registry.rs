use indexmap::IndexMap;

use super::profile::Profile;

/// Profiles available to a run, keyed by application name
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: IndexMap<String, Profile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        ProfileRegistry::default()
    }

    /// Registry pre-populated with the built-in profiles.
    pub fn with_builtins() -> Self {
        let mut registry = ProfileRegistry::new();
        for profile in Profile::builtin() {
            registry.insert(profile);
        }
        registry
    }

    /// Register a profile, replacing any existing profile with the same name.
    /// Returns the replaced profile.
    pub fn insert(&mut self, profile: Profile) -> Option<Profile> {
        self.profiles.insert(profile.name.clone(), profile)
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
