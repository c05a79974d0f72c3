//! Navigation trail shown above every page.
//!
//! Depth 0 is the home page and is never stored. A page at depth `n` keeps
//! the first `n` links of the trail and appends itself.

use crate::model::PaperId;
use crate::store::DbCache;

/// Crumb name used for pages whose paper is not cached.
pub const UNKNOWN_PAGE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breadcrumbs {
    links: Vec<Crumb>,
}

impl Breadcrumbs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `link` is now shown at `depth`.
    pub fn set_link_depth(&mut self, depth: usize, link: Crumb) {
        if depth == 0 {
            self.links.clear();
        } else {
            self.links.truncate(depth);
            self.links.push(link);
        }
    }

    pub fn links(&self) -> &[Crumb] {
        &self.links
    }

    pub fn is_home(&self) -> bool {
        self.links.is_empty()
    }
}

/// Path of the page showing paper `id`.
pub fn page_path(id: &PaperId) -> String {
    format!("/page/{id}")
}

/// Crumb for the page showing paper `id`, named after its title.
pub fn page_crumb(cache: &DbCache, id: &PaperId) -> Crumb {
    Crumb {
        name: cache
            .papers
            .get(id)
            .map_or_else(|| UNKNOWN_PAGE.to_string(), |p| p.title.clone()),
        path: page_path(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuthorId, Paper, PaperType};
    use chrono::Utc;

    fn crumb(name: &str) -> Crumb {
        Crumb {
            name: name.into(),
            path: format!("/{name}"),
        }
    }

    #[test]
    fn home_clears_trail() {
        let mut trail = Breadcrumbs::new();
        trail.set_link_depth(1, crumb("a"));
        trail.set_link_depth(0, crumb("home"));
        assert!(trail.is_home());
    }

    #[test]
    fn link_keeps_prefix_up_to_depth() {
        let mut trail = Breadcrumbs::new();
        trail.set_link_depth(1, crumb("a"));
        assert_eq!(trail.links(), [crumb("a")]);

        trail.set_link_depth(1, crumb("b"));
        assert_eq!(trail.links(), [crumb("a"), crumb("b")]);

        trail.set_link_depth(1, crumb("c"));
        assert_eq!(trail.links(), [crumb("a"), crumb("c")]);

        trail.set_link_depth(0, crumb("home"));
        trail.set_link_depth(1, crumb("d"));
        assert_eq!(trail.links(), [crumb("d")]);
    }

    #[test]
    fn page_crumb_uses_title_or_unknown() {
        let now = Utc::now();
        let id = PaperId::from("p1");
        let mut cache = DbCache::default();
        assert_eq!(page_crumb(&cache, &id).name, UNKNOWN_PAGE);

        cache.papers.insert(
            id.clone(),
            Paper {
                id: id.clone(),
                title: "Hello World".into(),
                body: "content".into(),
                kind: PaperType::Article,
                author: AuthorId::from("a1"),
                category: None,
                tags: vec![],
                created_at: now,
                updated_at: now,
            },
        );
        let c = page_crumb(&cache, &id);
        assert_eq!(c.name, "Hello World");
        assert_eq!(c.path, "/page/p1");
    }
}
