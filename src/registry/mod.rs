//! User registry
//!
//! An explicitly owned, in-memory map of users keyed by user name. The
//! tracker reads it through the [`UserSource`] trait so a cycle can be driven
//! from any population provider; workers never remove users, they only append
//! to the records behind the handles.

pub mod internal;

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{User, UserHandle};
use crate::error::Result;

pub use internal::{generate_internal_users, internal_user_name};

/// Source of the user population for a tracking cycle.
pub trait UserSource: Send + Sync {
    /// Every user that should be refreshed this cycle
    fn all_users(&self) -> Result<Vec<UserHandle>>;
}

#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<HashMap<String, UserHandle>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with `count` generated users
    pub fn with_internal_users(count: usize) -> Self {
        let registry = Self::new();
        for user in generate_internal_users(count) {
            registry.add(user);
        }
        log::debug!("Created {} internal test users", count);
        registry
    }

    pub fn get(&self, user_name: &str) -> Option<UserHandle> {
        self.read_map().get(user_name).cloned()
    }

    pub fn get_all(&self) -> Vec<UserHandle> {
        self.read_map().values().cloned().collect()
    }

    /// Add a user unless the name is already taken. Returns the handle stored
    /// under that name and whether it was newly inserted.
    pub fn add(&self, user: User) -> (UserHandle, bool) {
        let mut users = self.users.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = users.get(&user.user_name) {
            return (existing.clone(), false);
        }
        let handle = UserHandle::new(user);
        users.insert(handle.name().to_string(), handle.clone());
        (handle, true)
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, UserHandle>> {
        self.users.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UserSource for UserRegistry {
    fn all_users(&self) -> Result<Vec<UserHandle>> {
        Ok(self.get_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_user(name: &str) -> User {
        User::new(Uuid::new_v4(), name, "000", format!("{}@tourGuide.com", name))
    }

    #[test]
    fn test_add_and_get() {
        let registry = UserRegistry::new();
        let user = make_user("jon");
        let id = user.user_id;

        let (handle, inserted) = registry.add(user);
        assert!(inserted);
        assert_eq!(handle.id(), id);

        let fetched = registry.get("jon").unwrap();
        assert!(fetched.same_record(&handle));
    }

    #[test]
    fn test_add_existing_name_keeps_first() {
        let registry = UserRegistry::new();
        let (first, _) = registry.add(make_user("jon"));
        let (second, inserted) = registry.add(make_user("jon"));

        assert!(!inserted);
        assert!(second.same_record(&first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let registry = UserRegistry::new();
        assert!(registry.get("nobody").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_all() {
        let registry = UserRegistry::new();
        registry.add(make_user("jon1"));
        registry.add(make_user("jon2"));
        registry.add(make_user("jon3"));

        let mut names: Vec<String> = registry.get_all().iter().map(|h| h.name().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["jon1", "jon2", "jon3"]);
        assert_eq!(registry.all_users().unwrap().len(), 3);
    }

    #[test]
    fn test_with_internal_users() {
        let registry = UserRegistry::with_internal_users(5);
        assert_eq!(registry.len(), 5);
        assert!(registry.get("internalUser4").is_some());
    }
}
