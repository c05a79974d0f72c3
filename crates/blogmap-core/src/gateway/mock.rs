//! In-memory backend for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;

use super::{BlogBackend, GatewayError, GatewayFuture};
use crate::model::{Author, AuthorDraft, AuthorId, Listing, Paper, PaperDraft, PaperId};

/// Gateway operation, used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListPapers,
    CreatePaper,
    UpdatePaper,
    DeletePaper,
    ListAuthors,
    CreateAuthor,
    UpdateAuthor,
    DeleteAuthor,
}

#[derive(Default)]
struct Collections {
    papers: Vec<Paper>,
    authors: Vec<Author>,
}

/// A hand-rolled [`BlogBackend`] that behaves like the real server.
///
/// Supports:
/// - Seeded collections, assigned ids (`mock-0001`, ...) and timestamps.
/// - A scripted failure per [`Op`] (returned on every call to that op).
/// - Optional per-call latency.
/// - Call counting via [`call_count()`](MockBackend::call_count), and the
///   base URI of every call via [`bases()`](MockBackend::bases).
pub struct MockBackend {
    collections: Mutex<Collections>,
    failures: Mutex<HashMap<Op, GatewayError>>,
    calls: Mutex<HashMap<Op, usize>>,
    bases: Mutex<Vec<(Op, String)>>,
    delay: Option<Duration>,
    next_id: AtomicU64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(entity: &str) -> GatewayError {
    GatewayError::Backend {
        status: 404,
        message: format!("{entity} not found"),
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(Collections::default()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            bases: Mutex::new(Vec::new()),
            delay: None,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_papers(self, papers: Vec<Paper>) -> Self {
        lock(&self.collections).papers = papers;
        self
    }

    pub fn with_authors(self, authors: Vec<Author>) -> Self {
        lock(&self.collections).authors = authors;
        self
    }

    /// Make every call to `op` fail with `err`.
    pub fn failing(self, op: Op, err: GatewayError) -> Self {
        lock(&self.failures).insert(op, err);
        self
    }

    /// Set simulated network latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `op` has been called.
    pub fn call_count(&self, op: Op) -> usize {
        lock(&self.calls).get(&op).copied().unwrap_or(0)
    }

    /// Total calls across every op.
    pub fn total_calls(&self) -> usize {
        lock(&self.calls).values().sum()
    }

    /// Each call's op and base URI, in call order.
    pub fn bases(&self) -> Vec<(Op, String)> {
        lock(&self.bases).clone()
    }

    /// Base URI of the most recent call.
    pub fn last_base(&self) -> Option<String> {
        lock(&self.bases).last().map(|(_, base)| base.clone())
    }

    /// Server-side papers.
    pub fn papers(&self) -> Vec<Paper> {
        lock(&self.collections).papers.clone()
    }

    /// Server-side authors.
    pub fn authors(&self) -> Vec<Author> {
        lock(&self.collections).authors.clone()
    }

    fn next_id(&self) -> String {
        format!("mock-{:04}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Record the call and run `f` after the configured delay, unless `op`
    /// is scripted to fail.
    fn call<'a, T, F>(&'a self, op: Op, base: &str, f: F) -> GatewayFuture<'a, T>
    where
        T: Send + 'a,
        F: FnOnce(&'a Self) -> Result<T, GatewayError> + Send + 'a,
    {
        *lock(&self.calls).entry(op).or_insert(0) += 1;
        lock(&self.bases).push((op, base.to_string()));
        let failure = lock(&self.failures).get(&op).cloned();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match failure {
                Some(err) => Err(err),
                None => f(self),
            }
        })
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BlogBackend for MockBackend {
    fn list_papers<'a>(&'a self, base: &'a str) -> GatewayFuture<'a, Listing<Paper>> {
        self.call(Op::ListPapers, base, |me| Ok(Listing::new(me.papers())))
    }

    fn create_paper<'a>(
        &'a self,
        base: &'a str,
        draft: &'a PaperDraft,
    ) -> GatewayFuture<'a, Paper> {
        self.call(Op::CreatePaper, base, move |me| {
            let now = Utc::now();
            let paper = Paper {
                id: PaperId(me.next_id()),
                title: draft.title.clone(),
                body: draft.body.clone(),
                kind: draft.kind,
                author: draft.author.clone(),
                category: draft.category.clone(),
                tags: draft.tags.clone(),
                created_at: now,
                updated_at: now,
            };
            lock(&me.collections).papers.push(paper.clone());
            Ok(paper)
        })
    }

    fn update_paper<'a>(
        &'a self,
        base: &'a str,
        id: &'a PaperId,
        patch: &'a PaperDraft,
    ) -> GatewayFuture<'a, Paper> {
        self.call(Op::UpdatePaper, base, move |me| {
            let mut collections = lock(&me.collections);
            let paper = collections
                .papers
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| not_found("Paper"))?;
            paper.title = patch.title.clone();
            paper.body = patch.body.clone();
            paper.kind = patch.kind;
            paper.author = patch.author.clone();
            paper.category = patch.category.clone();
            paper.tags = patch.tags.clone();
            paper.updated_at = Utc::now();
            Ok(paper.clone())
        })
    }

    fn delete_paper<'a>(&'a self, base: &'a str, id: &'a PaperId) -> GatewayFuture<'a, Paper> {
        self.call(Op::DeletePaper, base, move |me| {
            let mut collections = lock(&me.collections);
            let idx = collections
                .papers
                .iter()
                .position(|p| &p.id == id)
                .ok_or_else(|| not_found("Paper"))?;
            Ok(collections.papers.remove(idx))
        })
    }

    fn list_authors<'a>(&'a self, base: &'a str) -> GatewayFuture<'a, Listing<Author>> {
        self.call(Op::ListAuthors, base, |me| Ok(Listing::new(me.authors())))
    }

    fn create_author<'a>(
        &'a self,
        base: &'a str,
        draft: &'a AuthorDraft,
    ) -> GatewayFuture<'a, Author> {
        self.call(Op::CreateAuthor, base, move |me| {
            let now = Utc::now();
            let author = Author {
                id: AuthorId(me.next_id()),
                name: draft.name.trim().to_string(),
                created_at: Some(now),
                updated_at: Some(now),
            };
            lock(&me.collections).authors.push(author.clone());
            Ok(author)
        })
    }

    fn update_author<'a>(
        &'a self,
        base: &'a str,
        id: &'a AuthorId,
        patch: &'a AuthorDraft,
    ) -> GatewayFuture<'a, Author> {
        self.call(Op::UpdateAuthor, base, move |me| {
            let mut collections = lock(&me.collections);
            let author = collections
                .authors
                .iter_mut()
                .find(|a| &a.id == id)
                .ok_or_else(|| not_found("Author"))?;
            author.name = patch.name.trim().to_string();
            author.updated_at = Some(Utc::now());
            Ok(author.clone())
        })
    }

    fn delete_author<'a>(
        &'a self,
        base: &'a str,
        id: &'a AuthorId,
    ) -> GatewayFuture<'a, Author> {
        self.call(Op::DeleteAuthor, base, move |me| {
            let mut collections = lock(&me.collections);
            let idx = collections
                .authors
                .iter()
                .position(|a| &a.id == id)
                .ok_or_else(|| not_found("Author"))?;
            Ok(collections.authors.remove(idx))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaperType;

    #[tokio::test]
    async fn create_assigns_ids_and_counts_calls() {
        let mock = MockBackend::new();
        let a = mock
            .create_author("", &AuthorDraft { name: " Alice ".into() })
            .await
            .unwrap();
        assert_eq!(a.name, "Alice");
        assert!(a.id.as_str().starts_with("mock-"));
        assert_eq!(mock.call_count(Op::CreateAuthor), 1);
        assert_eq!(mock.authors().len(), 1);
        assert_eq!(mock.bases(), [(Op::CreateAuthor, String::new())]);
    }

    #[tokio::test]
    async fn scripted_failure_is_returned() {
        let err = GatewayError::Backend {
            status: 500,
            message: "boom".into(),
        };
        let mock = MockBackend::new().failing(Op::ListPapers, err.clone());
        assert_eq!(mock.list_papers("").await.unwrap_err(), err);
        assert_eq!(mock.call_count(Op::ListPapers), 1);
    }

    #[tokio::test]
    async fn update_missing_paper_is_not_found() {
        let mock = MockBackend::new();
        let patch = PaperDraft {
            title: "Missing paper".into(),
            body: "x".into(),
            kind: PaperType::Block,
            author: AuthorId::from("a1"),
            category: None,
            tags: vec![],
        };
        let err = mock
            .update_paper("", &PaperId::from("nope"), &patch)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
