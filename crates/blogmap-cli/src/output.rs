use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use blogmap_core::breadcrumb::Breadcrumbs;
use blogmap_core::config_file::{ConfigFile, LOCAL_CONFIG};
use blogmap_core::{Author, AuthorId, Paper, SyncReport, ValidationErrors};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

const UNKNOWN_AUTHOR: &str = "unknown author";

fn short_date(paper: &Paper) -> String {
    paper.created_at.format("%Y-%m-%d").to_string()
}

/// Warn about collections the initial sync could not fetch.
pub fn print_sync_failures(
    w: &mut dyn Write,
    report: &SyncReport,
    color: ColorMode,
) -> std::io::Result<()> {
    for (collection, err) in report.failures() {
        let msg = format!("Could not load {}: {}", collection, err.message());
        if color.enabled() {
            writeln!(w, "{} {}", "WARNING:".yellow(), msg)?;
        } else {
            writeln!(w, "WARNING: {}", msg)?;
        }
    }
    Ok(())
}

/// Print one line per paper: date, id, type, title, author and tags.
pub fn print_paper_list(
    w: &mut dyn Write,
    papers: &[&Paper],
    authors: &HashMap<AuthorId, Author>,
    color: ColorMode,
) -> std::io::Result<()> {
    if papers.is_empty() {
        writeln!(w, "No papers found")?;
        return Ok(());
    }

    for paper in papers {
        let author = authors
            .get(&paper.author)
            .map_or(UNKNOWN_AUTHOR, |a| a.name.as_str());
        let tags = if paper.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", paper.tags.join(", "))
        };
        if color.enabled() {
            writeln!(
                w,
                "{} {} {:<11} {} - {}{}",
                short_date(paper).dimmed(),
                paper.id.as_str().cyan(),
                paper.kind.label(),
                paper.title.bold(),
                author,
                tags.dimmed()
            )?;
        } else {
            writeln!(
                w,
                "{} {} {:<11} {} - {}{}",
                short_date(paper),
                paper.id,
                paper.kind.label(),
                paper.title,
                author,
                tags
            )?;
        }
    }
    writeln!(w)?;
    writeln!(w, "{} paper(s)", papers.len())?;
    Ok(())
}

pub fn print_breadcrumbs(
    w: &mut dyn Write,
    trail: &Breadcrumbs,
    color: ColorMode,
) -> std::io::Result<()> {
    let mut line = String::from("Home");
    for crumb in trail.links() {
        line.push_str(" > ");
        line.push_str(&crumb.name);
    }
    if color.enabled() {
        writeln!(w, "{}", line.dimmed())?;
    } else {
        writeln!(w, "{}", line)?;
    }
    Ok(())
}

/// Print a paper's header followed by its (possibly rendered) body.
pub fn print_paper(
    w: &mut dyn Write,
    paper: &Paper,
    author: &Author,
    body: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", paper.title.bold())?;
        writeln!(
            w,
            "{} by {} on {}",
            paper.kind.label().cyan(),
            author.name.green(),
            short_date(paper)
        )?;
    } else {
        writeln!(w, "{}", paper.title)?;
        writeln!(
            w,
            "{} by {} on {}",
            paper.kind.label(),
            author.name,
            short_date(paper)
        )?;
    }
    if let Some(category) = &paper.category {
        writeln!(w, "Category: {}", category)?;
    }
    if !paper.tags.is_empty() {
        writeln!(w, "Tags: {}", paper.tags.join(", "))?;
    }
    writeln!(w)?;
    writeln!(w, "{}", body.trim_end())?;
    Ok(())
}

/// Print authors with the number of cached papers each has written.
pub fn print_authors(
    w: &mut dyn Write,
    rows: &[(&Author, usize)],
    color: ColorMode,
) -> std::io::Result<()> {
    if rows.is_empty() {
        writeln!(w, "No authors found")?;
        return Ok(());
    }
    for (author, count) in rows {
        if color.enabled() {
            writeln!(
                w,
                "{} {} ({} paper(s))",
                author.id.as_str().cyan(),
                author.name.bold(),
                count
            )?;
        } else {
            writeln!(w, "{} {} ({} paper(s))", author.id, author.name, count)?;
        }
    }
    Ok(())
}

pub fn print_validation_errors(
    w: &mut dyn Write,
    errors: &ValidationErrors,
    color: ColorMode,
) -> std::io::Result<()> {
    for e in &errors.errors {
        if color.enabled() {
            writeln!(w, "{} {}: {}", "INVALID".red(), e.field, e.message)?;
        } else {
            writeln!(w, "INVALID {}: {}", e.field, e.message)?;
        }
    }
    Ok(())
}

pub fn print_done(w: &mut dyn Write, msg: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", msg.green())
    } else {
        writeln!(w, "{}", msg)
    }
}

/// Show where config is read from and which backend is in effect.
pub fn print_config(
    w: &mut dyn Write,
    platform_path: Option<&Path>,
    merged: &ConfigFile,
    effective_backend: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    let platform = platform_path.map_or_else(
        || "(no config directory)".to_string(),
        |p| p.display().to_string(),
    );
    writeln!(w, "Platform config: {}", platform)?;
    writeln!(w, "Local config:    ./{}", LOCAL_CONFIG)?;
    writeln!(
        w,
        "File backend:    {}",
        merged.backend_uri().unwrap_or("(unset)")
    )?;
    let effective = if effective_backend.is_empty() {
        "(unset)"
    } else {
        effective_backend
    };
    if color.enabled() {
        writeln!(w, "Backend in use:  {}", effective.green())?;
    } else {
        writeln!(w, "Backend in use:  {}", effective)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogmap_core::PaperType;
    use chrono::{TimeZone, Utc};

    fn paper() -> Paper {
        let ts = Utc.with_ymd_and_hms(2021, 3, 4, 9, 0, 0).unwrap();
        Paper {
            id: "p1".into(),
            title: "Hello World".into(),
            body: "content".into(),
            kind: PaperType::WhitePaper,
            author: "a1".into(),
            category: None,
            tags: vec!["x".into(), "y".into()],
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn list_line_without_color() {
        let p = paper();
        let authors = HashMap::from([(
            AuthorId::from("a1"),
            Author {
                id: "a1".into(),
                name: "Alice".into(),
                created_at: None,
                updated_at: None,
            },
        )]);
        let mut buf = Vec::new();
        print_paper_list(&mut buf, &[&p], &authors, ColorMode(false)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("2021-03-04 p1 White-Paper Hello World - Alice [x, y]"));
        assert!(text.ends_with("1 paper(s)\n"));
    }

    #[test]
    fn missing_author_is_labelled() {
        let p = paper();
        let mut buf = Vec::new();
        print_paper_list(&mut buf, &[&p], &HashMap::new(), ColorMode(false)).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains(UNKNOWN_AUTHOR));
    }
}
