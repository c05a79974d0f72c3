use std::collections::HashMap;

use crate::action::Action;
use crate::store::Store;

/// Compute the next store from the current one and an action.
///
/// Total over [`Action`]: never fails, never performs I/O. Kinds it does not
/// recognize, and bulk replacements whose payload is not a collection, return
/// `state` unchanged.
pub fn reduce(mut state: Store, action: Action) -> Store {
    match action {
        Action::SetInitStore(store) => store,
        Action::SetBackendUri(uri) => {
            state.uri.backend = uri;
            state
        }
        Action::SetSyncStatus(status) => {
            state.db.synced = status.synced;
            if status.last_synced.is_some() {
                state.db.last_synced = status.last_synced;
            }
            state
        }
        Action::SetPapers(Some(papers)) => {
            state.db.papers = papers
                .into_iter()
                .map(|paper| (paper.id.clone(), paper))
                .collect::<HashMap<_, _>>();
            state
        }
        Action::SetAuthors(Some(authors)) => {
            state.db.authors = authors
                .into_iter()
                .map(|author| (author.id.clone(), author))
                .collect::<HashMap<_, _>>();
            state
        }
        Action::AddPaper(paper) | Action::ModPaper(paper) => {
            state.db.papers.insert(paper.id.clone(), paper);
            state
        }
        Action::AddAuthor(author) | Action::ModAuthor(author) => {
            state.db.authors.insert(author.id.clone(), author);
            state
        }
        Action::RemPaper { id } => {
            state.db.papers.remove(&id);
            state
        }
        Action::RemAuthor { id } => {
            state.db.authors.remove(&id);
            state
        }
        Action::SetPapers(None) | Action::SetAuthors(None) | Action::Unknown => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Author, AuthorId, Paper, PaperId, PaperType};
    use crate::store::SyncStatus;
    use chrono::{TimeZone, Utc};

    fn paper(id: &str, title: &str) -> Paper {
        let ts = Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap();
        Paper {
            id: PaperId::from(id),
            title: title.into(),
            body: "body".into(),
            kind: PaperType::Article,
            author: AuthorId::from("a1"),
            category: None,
            tags: vec![],
            created_at: ts,
            updated_at: ts,
        }
    }

    fn author(id: &str, name: &str) -> Author {
        Author {
            id: AuthorId::from(id),
            name: name.into(),
            created_at: None,
            updated_at: None,
        }
    }

    fn seeded() -> Store {
        let mut store = Store::with_backend("http://localhost:4000");
        store = reduce(store, Action::AddPaper(paper("p1", "First paper")));
        reduce(store, Action::AddAuthor(author("a1", "Alice")))
    }

    #[test]
    fn unknown_action_is_identity() {
        let before = seeded();
        let after = reduce(before.clone(), Action::Unknown);
        assert_eq!(after, before);
    }

    #[test]
    fn noop_after_any_action_is_stable() {
        let once = reduce(seeded(), Action::AddPaper(paper("p2", "Second paper")));
        let twice = reduce(once.clone(), Action::Unknown);
        assert_eq!(twice, once);
    }

    #[test]
    fn same_input_same_output() {
        let action = Action::ModPaper(paper("p1", "Renamed paper"));
        assert_eq!(
            reduce(seeded(), action.clone()),
            reduce(seeded(), action)
        );
    }

    #[test]
    fn add_then_read_returns_record() {
        let p = paper("p9", "Ninth paper");
        let store = reduce(seeded(), Action::AddPaper(p.clone()));
        assert_eq!(store.db.papers.get(&p.id), Some(&p));
    }

    #[test]
    fn mod_overwrites_existing_record() {
        let p = paper("p1", "Rewritten title");
        let store = reduce(seeded(), Action::ModPaper(p.clone()));
        assert_eq!(store.db.papers.len(), 1);
        assert_eq!(store.db.papers[&p.id].title, "Rewritten title");
    }

    #[test]
    fn remove_present_and_absent_ids() {
        let store = reduce(
            seeded(),
            Action::RemPaper {
                id: PaperId::from("p1"),
            },
        );
        assert!(store.db.papers.is_empty());

        let again = reduce(
            store.clone(),
            Action::RemPaper {
                id: PaperId::from("p1"),
            },
        );
        assert_eq!(again, store);
    }

    #[test]
    fn remove_author_leaves_papers() {
        let store = reduce(
            seeded(),
            Action::RemAuthor {
                id: AuthorId::from("a1"),
            },
        );
        assert!(store.db.authors.is_empty());
        assert_eq!(store.db.papers.len(), 1);
    }

    #[test]
    fn set_papers_replaces_mapping() {
        let store = reduce(
            seeded(),
            Action::SetPapers(Some(vec![paper("p2", "Second"), paper("p3", "Third")])),
        );
        let mut ids: Vec<_> = store.db.papers.keys().map(|k| k.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["p2", "p3"]);
    }

    #[test]
    fn set_papers_with_duplicate_ids_keeps_last() {
        let store = reduce(
            Store::default(),
            Action::SetPapers(Some(vec![paper("p1", "old"), paper("p1", "new")])),
        );
        assert_eq!(store.db.papers.len(), 1);
        assert_eq!(store.db.papers[&PaperId::from("p1")].title, "new");
    }

    #[test]
    fn set_without_collection_is_noop() {
        let before = seeded();
        assert_eq!(reduce(before.clone(), Action::SetPapers(None)), before);
        assert_eq!(reduce(before.clone(), Action::SetAuthors(None)), before);
    }

    #[test]
    fn set_backend_uri_leaves_cache() {
        let before = seeded();
        let after = reduce(before.clone(), Action::SetBackendUri("http://other".into()));
        assert_eq!(after.uri.backend, "http://other");
        assert_eq!(after.db, before.db);
    }

    #[test]
    fn sync_status_merges_timestamp() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 2, 8, 0, 0).unwrap();
        let store = reduce(
            Store::default(),
            Action::SetSyncStatus(SyncStatus {
                synced: true,
                last_synced: Some(ts),
            }),
        );
        assert!(store.db.synced);
        assert_eq!(store.db.last_synced, Some(ts));

        let store = reduce(
            store,
            Action::SetSyncStatus(SyncStatus {
                synced: false,
                last_synced: None,
            }),
        );
        assert!(!store.db.synced);
        assert_eq!(store.db.last_synced, Some(ts));
    }

    #[test]
    fn init_store_replaces_everything() {
        let fresh = Store::with_backend("http://fresh");
        assert_eq!(reduce(seeded(), Action::SetInitStore(fresh.clone())), fresh);
    }
}
