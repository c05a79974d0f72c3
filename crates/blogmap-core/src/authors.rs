//! Author resolution: map a free-text author name to a stable author id,
//! reusing a cached author when one matches and creating one otherwise.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;

use crate::action::Action;
use crate::gateway::{BlogBackend, GatewayError};
use crate::model::{Author, AuthorDraft, AuthorId};
use crate::store::StoreHandle;

/// Comparison key for author names: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Find a cached author whose name matches `name` case-insensitively.
///
/// If the cache holds several matches (duplicates created server-side), the
/// one with the smallest id wins so the choice does not depend on map order.
pub fn find_author<'a>(authors: &'a HashMap<AuthorId, Author>, name: &str) -> Option<&'a Author> {
    let key = normalize_name(name);
    authors
        .values()
        .filter(|a| normalize_name(&a.name) == key)
        .min_by(|a, b| a.id.cmp(&b.id))
}

type Pending = Arc<OnceCell<Result<Author, GatewayError>>>;

/// Find-or-create resolver with in-flight de-duplication.
///
/// Concurrent resolutions of the same unknown name share a single
/// `create_author` request. The in-flight entry is cleared once that request
/// settles, after the new author has been dispatched into the store, so later
/// lookups hit the cache and a failed create can be retried.
#[derive(Default)]
pub struct AuthorResolver {
    in_flight: Mutex<HashMap<String, Pending>>,
}

impl AuthorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, Pending>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of author creations currently awaiting the backend.
    pub fn in_flight(&self) -> usize {
        self.pending().len()
    }

    pub async fn resolve(
        &self,
        store: &StoreHandle,
        backend: &dyn BlogBackend,
        name: &str,
    ) -> Result<AuthorId, GatewayError> {
        let cached = |store: &StoreHandle| {
            store.read(|s| find_author(&s.db.authors, name).map(|a| a.id.clone()))
        };

        if let Some(id) = cached(store) {
            tracing::debug!(name, id = %id, "author resolved from cache");
            return Ok(id);
        }

        let key = normalize_name(name);
        let cell = {
            let mut pending = self.pending();
            // An earlier create may have landed between the cache check and
            // taking the lock.
            if let Some(id) = cached(store) {
                return Ok(id);
            }
            Arc::clone(pending.entry(key.clone()).or_default())
        };

        let result = cell
            .get_or_init(|| async {
                let base = store.backend_uri();
                let draft = AuthorDraft {
                    name: name.trim().to_string(),
                };
                match backend.create_author(&base, &draft).await {
                    Ok(author) => {
                        tracing::info!(name = %author.name, id = %author.id, "created author");
                        store.dispatch(Action::AddAuthor(author.clone()));
                        Ok(author)
                    }
                    Err(err) => {
                        tracing::warn!(name, error = %err, "author creation failed");
                        Err(err)
                    }
                }
            })
            .await
            .clone();

        {
            let mut pending = self.pending();
            if pending.get(&key).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
                pending.remove(&key);
            }
        }

        result.map(|author| author.id)
    }
}

impl std::fmt::Debug for AuthorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorResolver")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{MockBackend, Op};
    use crate::store::Store;

    fn author(id: &str, name: &str) -> Author {
        Author {
            id: AuthorId::from(id),
            name: name.into(),
            created_at: None,
            updated_at: None,
        }
    }

    fn store_with(authors: Vec<Author>) -> StoreHandle {
        let store = StoreHandle::new(Store::with_backend("http://localhost:4000"));
        store.dispatch(Action::SetAuthors(Some(authors)));
        store
    }

    #[test]
    fn find_is_case_insensitive_and_trims() {
        let authors: HashMap<_, _> = [author("a1", "Alice")]
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        assert_eq!(find_author(&authors, "ALICE").unwrap().id.as_str(), "a1");
        assert_eq!(find_author(&authors, "  alice ").unwrap().id.as_str(), "a1");
        assert!(find_author(&authors, "Alicia").is_none());
    }

    #[test]
    fn find_prefers_smallest_id_among_duplicates() {
        let authors: HashMap<_, _> = [author("b2", "Alice"), author("a9", "alice")]
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        assert_eq!(find_author(&authors, "Alice").unwrap().id.as_str(), "a9");
    }

    #[tokio::test]
    async fn known_name_needs_no_create() {
        let store = store_with(vec![author("a1", "Alice")]);
        let mock = MockBackend::new();
        let resolver = AuthorResolver::new();

        let id = resolver.resolve(&store, &mock, "ALICE").await.unwrap();
        assert_eq!(id, AuthorId::from("a1"));
        assert_eq!(mock.call_count(Op::CreateAuthor), 0);
    }

    #[tokio::test]
    async fn unknown_name_creates_once_and_caches() {
        let store = store_with(vec![author("a1", "Alice")]);
        let mock = MockBackend::new();
        let resolver = AuthorResolver::new();

        let id = resolver.resolve(&store, &mock, "Bob Dylan").await.unwrap();
        assert_eq!(mock.call_count(Op::CreateAuthor), 1);
        assert!(store.read(|s| s.db.authors.contains_key(&id)));

        let again = resolver.resolve(&store, &mock, "bob dylan").await.unwrap();
        assert_eq!(again, id);
        assert_eq!(mock.call_count(Op::CreateAuthor), 1);
        assert_eq!(resolver.in_flight(), 0);
    }

    #[tokio::test]
    async fn failed_create_is_surfaced_and_retryable() {
        let store = store_with(vec![]);
        let err = GatewayError::Backend {
            status: 400,
            message: "name too short".into(),
        };
        let mock = MockBackend::new().failing(Op::CreateAuthor, err.clone());
        let resolver = AuthorResolver::new();

        assert_eq!(resolver.resolve(&store, &mock, "Carl").await, Err(err.clone()));
        assert_eq!(resolver.in_flight(), 0);
        assert!(store.read(|s| s.db.authors.is_empty()));

        assert_eq!(resolver.resolve(&store, &mock, "Carl").await, Err(err));
        assert_eq!(mock.call_count(Op::CreateAuthor), 2);
    }
}
