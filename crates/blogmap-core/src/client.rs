//! Store actions: gateway calls paired with the dispatches that mirror their
//! results into the cache.

use std::sync::Arc;

use thiserror::Error;

use crate::action::Action;
use crate::authors::AuthorResolver;
use crate::editor::{PaperForm, ValidationErrors};
use crate::gateway::{BlogBackend, GatewayError};
use crate::model::{Author, AuthorDraft, AuthorId, Paper, PaperDraft, PaperId};
use crate::store::StoreHandle;
use crate::sync::{SyncReport, populate_store};

/// Failure of an editor submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("invalid paper: {0}")]
    Invalid(ValidationErrors),
    /// The author could not be resolved; no paper request was sent.
    #[error("author resolution failed: {0}")]
    Author(GatewayError),
    #[error("paper submission failed: {0}")]
    Paper(GatewayError),
}

impl SubmitError {
    /// Form-level message for display.
    pub fn message(&self) -> String {
        match self {
            Self::Invalid(errs) => errs.to_string(),
            Self::Author(e) | Self::Paper(e) => e.message().to_string(),
        }
    }
}

/// The store paired with its backend.
///
/// Every call reads the backend URI from the store at call time.
pub struct BlogClient {
    store: StoreHandle,
    backend: Arc<dyn BlogBackend>,
    authors: AuthorResolver,
}

impl BlogClient {
    pub fn new(store: StoreHandle, backend: Arc<dyn BlogBackend>) -> Self {
        Self {
            store,
            backend,
            authors: AuthorResolver::new(),
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn set_backend_uri(&self, uri: impl Into<String>) {
        self.store.dispatch(Action::SetBackendUri(uri.into()));
    }

    pub async fn populate_store(&self) -> SyncReport {
        populate_store(&self.store, self.backend.as_ref()).await
    }

    /// Run the initial sync unless one has already started or no backend is
    /// configured. Returns `None` when nothing was fetched.
    pub async fn ensure_synced(&self) -> Option<SyncReport> {
        let (synced, has_backend) = self
            .store
            .read(|s| (s.db.synced, !s.uri.backend.is_empty()));
        if synced || !has_backend {
            tracing::debug!(synced, has_backend, "skipping sync");
            return None;
        }
        Some(self.populate_store().await)
    }

    fn base(&self) -> String {
        self.store.backend_uri()
    }

    pub async fn add_author(&self, draft: &AuthorDraft) -> Result<Author, GatewayError> {
        let author = self.backend.create_author(&self.base(), draft).await?;
        tracing::info!(entity = "author", id = %author.id, "added");
        self.store.dispatch(Action::AddAuthor(author.clone()));
        Ok(author)
    }

    pub async fn mod_author(
        &self,
        id: &AuthorId,
        patch: &AuthorDraft,
    ) -> Result<Author, GatewayError> {
        let author = self.backend.update_author(&self.base(), id, patch).await?;
        tracing::info!(entity = "author", id = %author.id, "modified");
        self.store.dispatch(Action::ModAuthor(author.clone()));
        Ok(author)
    }

    /// Remove locally first, then on the backend. A rejected delete puts the
    /// cached record back.
    pub async fn rem_author(&self, id: &AuthorId) -> Result<(), GatewayError> {
        let previous = self.store.read(|s| s.db.authors.get(id).cloned());
        self.store.dispatch(Action::RemAuthor { id: id.clone() });

        match self.backend.delete_author(&self.base(), id).await {
            Ok(_) => {
                tracing::info!(entity = "author", id = %id, "removed");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(entity = "author", id = %id, error = %err, "delete rejected, restoring");
                if let Some(author) = previous {
                    self.store.dispatch(Action::AddAuthor(author));
                }
                Err(err)
            }
        }
    }

    pub async fn add_paper(&self, draft: &PaperDraft) -> Result<Paper, GatewayError> {
        let paper = self.backend.create_paper(&self.base(), draft).await?;
        tracing::info!(entity = "paper", id = %paper.id, "added");
        self.store.dispatch(Action::AddPaper(paper.clone()));
        Ok(paper)
    }

    pub async fn mod_paper(&self, id: &PaperId, patch: &PaperDraft) -> Result<Paper, GatewayError> {
        let paper = self.backend.update_paper(&self.base(), id, patch).await?;
        tracing::info!(entity = "paper", id = %paper.id, "modified");
        self.store.dispatch(Action::ModPaper(paper.clone()));
        Ok(paper)
    }

    /// Remove locally first, then on the backend. A rejected delete puts the
    /// cached record back.
    pub async fn rem_paper(&self, id: &PaperId) -> Result<(), GatewayError> {
        let previous = self.store.read(|s| s.db.papers.get(id).cloned());
        self.store.dispatch(Action::RemPaper { id: id.clone() });

        match self.backend.delete_paper(&self.base(), id).await {
            Ok(_) => {
                tracing::info!(entity = "paper", id = %id, "removed");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(entity = "paper", id = %id, error = %err, "delete rejected, restoring");
                if let Some(paper) = previous {
                    self.store.dispatch(Action::AddPaper(paper));
                }
                Err(err)
            }
        }
    }

    /// Find or create the author called `name`.
    pub async fn resolve_author(&self, name: &str) -> Result<AuthorId, GatewayError> {
        self.authors
            .resolve(&self.store, self.backend.as_ref(), name)
            .await
    }

    async fn prepare(&self, form: PaperForm) -> Result<PaperDraft, SubmitError> {
        form.validate().map_err(SubmitError::Invalid)?;
        let author = self
            .resolve_author(&form.author_name)
            .await
            .map_err(SubmitError::Author)?;
        Ok(form.into_draft(author))
    }

    /// Validate `form`, resolve its author and create the paper.
    pub async fn submit_paper(&self, form: PaperForm) -> Result<Paper, SubmitError> {
        let draft = self.prepare(form).await?;
        self.add_paper(&draft).await.map_err(SubmitError::Paper)
    }

    /// Validate `form`, resolve its author and update paper `id`.
    pub async fn submit_paper_edit(
        &self,
        id: &PaperId,
        form: PaperForm,
    ) -> Result<Paper, SubmitError> {
        let draft = self.prepare(form).await?;
        self.mod_paper(id, &draft).await.map_err(SubmitError::Paper)
    }
}

impl std::fmt::Debug for BlogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlogClient")
            .field("store", &self.store)
            .field("authors", &self.authors)
            .finish_non_exhaustive()
    }
}
