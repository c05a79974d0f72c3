use chrono::Utc;

use crate::action::Action;
use crate::gateway::{BlogBackend, GatewayError};
use crate::store::{StoreHandle, SyncStatus};

/// Outcome of one bootstrap sync, per collection.
///
/// `Ok` carries the number of records received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub papers: Result<usize, GatewayError>,
    pub authors: Result<usize, GatewayError>,
}

impl SyncReport {
    /// Both collections were fetched.
    pub fn is_complete(&self) -> bool {
        self.papers.is_ok() && self.authors.is_ok()
    }

    /// Errors for the collections that failed, labelled by collection.
    pub fn failures(&self) -> Vec<(&'static str, &GatewayError)> {
        let mut out = Vec::new();
        if let Err(e) = &self.papers {
            out.push(("papers", e));
        }
        if let Err(e) = &self.authors {
            out.push(("authors", e));
        }
        out
    }
}

/// Fetch both collections into the store.
///
/// Sync status is marked complete before any request is issued, so callers
/// that gate on `synced` start at most one sync. Papers and authors are then
/// fetched concurrently; each successful listing replaces its mapping, and a
/// failed one is logged and leaves that mapping as it was. No retry. The
/// returned future never fails as a whole.
pub async fn populate_store(store: &StoreHandle, backend: &dyn BlogBackend) -> SyncReport {
    store.dispatch(Action::SetSyncStatus(SyncStatus {
        synced: true,
        last_synced: Some(Utc::now()),
    }));

    let base = store.backend_uri();

    let papers = async {
        match backend.list_papers(&base).await {
            Ok(listing) => {
                let count = listing.len();
                store.dispatch(Action::SetPapers(listing.data));
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(entity = "paper", error = %err, "populate store: error requesting papers");
                Err(err)
            }
        }
    };

    let authors = async {
        match backend.list_authors(&base).await {
            Ok(listing) => {
                let count = listing.len();
                store.dispatch(Action::SetAuthors(listing.data));
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(entity = "author", error = %err, "populate store: error requesting authors");
                Err(err)
            }
        }
    };

    let (papers, authors) = tokio::join!(papers, authors);

    let report = SyncReport { papers, authors };
    tracing::info!(
        papers = report.papers.as_ref().ok(),
        authors = report.authors.as_ref().ok(),
        complete = report.is_complete(),
        "store populated"
    );
    report
}
