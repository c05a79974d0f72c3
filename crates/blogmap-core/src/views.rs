//! Read-only projections over the cache: the filtered paper list, the tag
//! filter set, and the paper/author join used by the page view.
//!
//! Everything here is a pure function of its inputs and can be recomputed
//! whenever the store changes.

use std::cmp::Reverse;
use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::editor::PaperForm;
use crate::model::{Author, AuthorId, Paper, PaperId};
use crate::store::DbCache;

/// Active tag filters, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    tags: Vec<String>,
}

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag`. Returns false if it was already active.
    pub fn add(&mut self, tag: &str) -> bool {
        if self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove `tag`. Returns false if it was not active.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// True when no filter is active or `paper` carries any active tag.
    pub fn admits(&self, paper: &Paper) -> bool {
        self.is_empty() || paper.tags.iter().any(|t| self.contains(t))
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut filter = Self::new();
        for tag in iter {
            filter.add(tag.as_ref());
        }
        filter
    }
}

/// Case-insensitive title matcher.
///
/// The query is used as a regular expression; if it does not compile (an
/// unbalanced `(` typed mid-search, say) it is matched as a literal
/// substring instead.
#[derive(Debug, Clone)]
pub enum TitleMatcher {
    Pattern(Regex),
    Literal(String),
}

impl TitleMatcher {
    pub fn new(query: &str) -> Self {
        match RegexBuilder::new(query).case_insensitive(true).build() {
            Ok(re) => Self::Pattern(re),
            Err(_) => Self::Literal(query.to_lowercase()),
        }
    }

    pub fn is_match(&self, title: &str) -> bool {
        match self {
            Self::Pattern(re) => re.is_match(title),
            Self::Literal(needle) => title.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Filter state for the paper list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperFilter {
    pub tags: TagFilter,
    /// Empty or absent means no title filtering.
    pub title: Option<String>,
}

impl PaperFilter {
    pub fn matcher(&self) -> Option<TitleMatcher> {
        self.title
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(TitleMatcher::new)
    }
}

/// Papers passing `filter`, newest first (ties broken by id).
pub fn filtered_papers<'a>(cache: &'a DbCache, filter: &PaperFilter) -> Vec<&'a Paper> {
    let matcher = filter.matcher();
    let mut list: Vec<&Paper> = cache
        .papers
        .values()
        .filter(|p| filter.tags.admits(p))
        .filter(|p| matcher.as_ref().is_none_or(|m| m.is_match(&p.title)))
        .collect();
    list.sort_by_key(|p| (Reverse(p.created_at), p.id.clone()));
    list
}

/// Every distinct tag in the cache with its usage count, most used first.
pub fn tag_counts(cache: &DbCache) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for paper in cache.papers.values() {
        for tag in &paper.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(t, c)| (t.to_string(), c))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// What the page view could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Paper,
    Author,
}

/// A paper joined with its author, or the reason it cannot be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView<'a> {
    Found { paper: &'a Paper, author: &'a Author },
    NotFound(Missing),
}

impl PageView<'_> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

pub fn page_view<'a>(cache: &'a DbCache, id: &PaperId) -> PageView<'a> {
    let Some(paper) = cache.papers.get(id) else {
        return PageView::NotFound(Missing::Paper);
    };
    match cache.authors.get(&paper.author) {
        Some(author) => PageView::Found { paper, author },
        None => PageView::NotFound(Missing::Author),
    }
}

/// Author of the paper with `id`, if both are cached.
pub fn paper_author<'a>(cache: &'a DbCache, id: &PaperId) -> Option<&'a Author> {
    match page_view(cache, id) {
        PageView::Found { author, .. } => Some(author),
        PageView::NotFound(_) => None,
    }
}

/// Papers written by the author with `author_id`, newest first.
pub fn papers_by_author<'a>(
    cache: &'a DbCache,
    author_id: &AuthorId,
) -> Vec<&'a Paper> {
    let mut list: Vec<&Paper> = cache
        .papers
        .values()
        .filter(|p| &p.author == author_id)
        .collect();
    list.sort_by_key(|p| (Reverse(p.created_at), p.id.clone()));
    list
}

/// Edit form pre-filled from cached paper `id`, with the author shown by name.
pub fn paper_editor_form(cache: &DbCache, id: &PaperId) -> Option<PaperForm> {
    cache
        .papers
        .get(id)
        .map(|p| PaperForm::from_paper(p, &cache.authors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaperType;
    use chrono::{TimeZone, Utc};

    fn paper(id: &str, title: &str, tags: &[&str], day: u32) -> Paper {
        let ts = Utc.with_ymd_and_hms(2021, 3, day, 9, 0, 0).unwrap();
        Paper {
            id: PaperId::from(id),
            title: title.into(),
            body: "body".into(),
            kind: PaperType::Article,
            author: AuthorId::from("a1"),
            category: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn cache(papers: Vec<Paper>) -> DbCache {
        DbCache {
            papers: papers.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..DbCache::default()
        }
    }

    fn ids(list: &[&Paper]) -> Vec<String> {
        list.iter().map(|p| p.id.to_string()).collect()
    }

    #[test]
    fn tag_filter_ignores_duplicate_add_and_absent_remove() {
        let mut filter = TagFilter::new();
        assert!(filter.add("rust"));
        assert!(!filter.add("rust"));
        assert!(!filter.remove("go"));
        assert_eq!(filter.tags(), ["rust"]);
        assert!(filter.remove("rust"));
        assert!(filter.is_empty());
    }

    #[test]
    fn tag_filter_keeps_papers_sharing_any_tag() {
        let c = cache(vec![
            paper("p1", "One paper here", &["t1"], 1),
            paper("p2", "Two paper here", &["t2"], 2),
            paper("p3", "Three paper here", &["t1", "t2"], 3),
        ]);
        let filter = PaperFilter {
            tags: ["t1"].into_iter().collect(),
            title: None,
        };
        assert_eq!(ids(&filtered_papers(&c, &filter)), ["p3", "p1"]);
    }

    #[test]
    fn title_filter_is_case_insensitive_substring() {
        let c = cache(vec![
            paper("p1", "Foo bar", &[], 1),
            paper("p2", "baz", &[], 2),
        ]);
        let filter = PaperFilter {
            title: Some("foo".into()),
            ..PaperFilter::default()
        };
        assert_eq!(ids(&filtered_papers(&c, &filter)), ["p1"]);
    }

    #[test]
    fn title_filter_accepts_patterns() {
        let c = cache(vec![
            paper("p1", "Rust 2021 edition", &[], 1),
            paper("p2", "Rust notes", &[], 2),
        ]);
        let filter = PaperFilter {
            title: Some(r"rust \d+".into()),
            ..PaperFilter::default()
        };
        assert_eq!(ids(&filtered_papers(&c, &filter)), ["p1"]);
    }

    #[test]
    fn invalid_pattern_falls_back_to_literal() {
        let matcher = TitleMatcher::new("(draft");
        assert!(matcher.is_match("My (Draft) notes"));
        assert!(!matcher.is_match("Final notes"));
    }

    #[test]
    fn empty_title_filter_keeps_everything() {
        let c = cache(vec![paper("p1", "Anything", &[], 1)]);
        let filter = PaperFilter {
            title: Some(String::new()),
            ..PaperFilter::default()
        };
        assert_eq!(filtered_papers(&c, &filter).len(), 1);
    }

    #[test]
    fn tags_and_title_compose() {
        let c = cache(vec![
            paper("p1", "Foo tagged", &["t1"], 1),
            paper("p2", "Foo untagged", &[], 2),
            paper("p3", "Bar tagged", &["t1"], 3),
        ]);
        let filter = PaperFilter {
            tags: ["t1"].into_iter().collect(),
            title: Some("FOO".into()),
        };
        assert_eq!(ids(&filtered_papers(&c, &filter)), ["p1"]);
    }

    #[test]
    fn sorted_newest_first() {
        let c = cache(vec![
            paper("p1", "T one", &[], 1),
            paper("p3", "T three", &[], 3),
            paper("p2", "T two", &[], 2),
        ]);
        assert_eq!(
            ids(&filtered_papers(&c, &PaperFilter::default())),
            ["p3", "p2", "p1"]
        );
    }

    #[test]
    fn tag_counts_orders_by_use() {
        let c = cache(vec![
            paper("p1", "One", &["rust", "web"], 1),
            paper("p2", "Two", &["rust"], 2),
        ]);
        assert_eq!(
            tag_counts(&c),
            vec![("rust".to_string(), 2), ("web".to_string(), 1)]
        );
    }

    #[test]
    fn page_view_reports_what_is_missing() {
        let mut c = cache(vec![paper("p1", "Orphan paper", &[], 1)]);
        assert_eq!(
            page_view(&c, &PaperId::from("nope")),
            PageView::NotFound(Missing::Paper)
        );
        assert_eq!(
            page_view(&c, &PaperId::from("p1")),
            PageView::NotFound(Missing::Author)
        );

        c.authors.insert(
            AuthorId::from("a1"),
            Author {
                id: AuthorId::from("a1"),
                name: "Alice".into(),
                created_at: None,
                updated_at: None,
            },
        );
        let view = page_view(&c, &PaperId::from("p1"));
        assert!(view.is_found());
        assert_eq!(
            paper_author(&c, &PaperId::from("p1")).map(|a| a.name.as_str()),
            Some("Alice")
        );
        assert_eq!(papers_by_author(&c, &AuthorId::from("a1")).len(), 1);

        let form = paper_editor_form(&c, &PaperId::from("p1")).unwrap();
        assert_eq!(form.author_name, "Alice");
        assert_eq!(form.title, "Orphan paper");
        assert!(paper_editor_form(&c, &PaperId::from("nope")).is_none());
    }
}
