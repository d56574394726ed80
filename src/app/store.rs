//! In-memory users store.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default)]
pub struct UserStore {
    users: DashMap<Uuid, User>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All users, ordered by id for stable listings.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by_key(|user| user.id);
        users
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    pub fn create(&self, new_user: NewUser) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
        };
        self.users.insert(user.id, user.clone());
        user
    }

    pub fn update(&self, id: Uuid, new_user: NewUser) -> Option<User> {
        self.users.get_mut(&id).map(|mut entry| {
            entry.name = new_user.name;
            entry.email = new_user.email;
            entry.clone()
        })
    }

    pub fn delete(&self, id: Uuid) -> bool {
        self.users.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: format!("{name}@example.com"),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = UserStore::new();

        let created = store.create(new_user("alice"));

        assert_eq!(store.get(created.id), Some(created));
    }

    #[test]
    fn test_update_missing_user_returns_none() {
        let store = UserStore::new();

        assert_eq!(store.update(Uuid::new_v4(), new_user("ghost")), None);
    }

    #[test]
    fn test_update_overwrites_fields() {
        let store = UserStore::new();
        let created = store.create(new_user("alice"));

        let updated = store.update(created.id, new_user("bob")).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "bob");
        assert_eq!(store.get(created.id).unwrap().name, "bob");
    }

    #[test]
    fn test_delete() {
        let store = UserStore::new();
        let created = store.create(new_user("alice"));

        assert!(store.delete(created.id));
        assert!(!store.delete(created.id));
        assert_eq!(store.get(created.id), None);
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let store = UserStore::new();
        for name in ["a", "b", "c"] {
            store.create(new_user(name));
        }

        let listed = store.list();

        assert_eq!(listed.len(), 3);
        assert!(listed.windows(2).all(|pair| pair[0].id <= pair[1].id));
    }
}
