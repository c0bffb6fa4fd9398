use crate::context::{report, AppContext};
use anyhow::{anyhow, bail, Context, Result};
use audioteca_catalog::{page_numbers, CatalogPage, PageItem};
use audioteca_core::{
    Book, BookId, Bookmark, Duration, SearchFilters, SearchType, Theme, Timestamp,
};
use audioteca_playback::ChapterList;
use audioteca_storage::{ClientState, RecentBook, ResumeRecord};
use clap::ArgMatches;
use console::style;

/// Where an `open` path leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Catalog,
    Book(BookId),
}

/// Maps an app path onto a view; unknown paths land on the catalog
pub fn resolve_route(path: &str) -> Route {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["book", id] | ["audiobook", id] => Route::Book(BookId::new(*id)),
        _ => Route::Catalog,
    }
}

/// Search the catalog and print one page of results
pub async fn browse_catalog(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let query = matches
        .get_one::<String>("query")
        .cloned()
        .unwrap_or_default();
    let kind = match matches.get_one::<String>("type") {
        Some(kind) => kind.parse::<SearchType>().map_err(|e| anyhow!(e))?,
        None => SearchType::All,
    };
    let page = matches.get_one::<u32>("page").copied().unwrap_or(1).max(1);

    show_catalog(ctx, SearchFilters::new(query, kind), page).await
}

async fn show_catalog(ctx: &AppContext, filters: SearchFilters, page: u32) -> Result<()> {
    let catalog = ctx.catalog().await?;
    let result = catalog
        .search(&filters, page, ctx.per_page())
        .await
        .map_err(report)?;
    let state = ctx.state()?;

    if result.books.is_empty() {
        if filters.is_empty() {
            println!("The catalog is empty.");
        } else {
            println!("No audiobooks found for '{}'", filters.query);
        }
        return Ok(());
    }

    print_page_header(&result, &filters);
    for book in &result.books {
        print_book_summary(book, state.favorites.is_favorite(&book.id));
    }
    println!();
    println!("  {}", format_page_strip(result.pagination.current_page, result.pagination.total_pages));

    Ok(())
}

fn print_page_header(page: &CatalogPage, filters: &SearchFilters) {
    let heading = if filters.is_empty() {
        "Audiobooks".to_string()
    } else {
        format!("Results for '{}' ({})", filters.query, filters.kind)
    };
    println!(
        "\n{} {}",
        style(page.pagination.total).bold().cyan(),
        heading
    );
    println!("{}", "=".repeat(80));
}

/// Show one book and remember it as recently opened
pub async fn show_book(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow!("Book ID is required"))?;
    let as_json = matches.get_flag("json");

    show_book_detail(ctx, &BookId::new(id.trim()), as_json).await
}

async fn show_book_detail(ctx: &AppContext, id: &BookId, as_json: bool) -> Result<()> {
    let catalog = ctx.catalog().await?;
    let book = catalog.book(id).await.map_err(report)?;
    let state = ctx.state()?;
    state.recent.add(RecentBook::from(&book));

    if as_json {
        let json = serde_json::to_string_pretty(&book).context("Failed to serialize book")?;
        println!("{}", json);
        return Ok(());
    }

    print_book_detail(&book, &state);
    Ok(())
}

fn print_book_detail(book: &Book, state: &ClientState) {
    println!("\n{}", style(&book.title).bold().cyan());
    println!("{}", "=".repeat(80));
    println!("ID: {}", book.id);
    if let Some(original) = &book.original_title {
        println!("Original title: {}", original);
    }
    if !book.authors.is_empty() {
        println!("Author: {}", book.author_names().join(", "));
    }
    if !book.narrators.is_empty() {
        println!("Narrator: {}", book.narrator_names().join(", "));
    }
    if !book.genres.is_empty() {
        println!("Genres: {}", book.genres.join(", "));
    }
    if !book.language.is_empty() {
        println!("Language: {}", book.language);
    }
    println!("Duration: {}", book.duration);
    if book.is_abridged {
        println!("Abridged edition");
    }
    if state.favorites.is_favorite(&book.id) {
        println!("{}", style("★ Favorite").yellow());
    }

    if !book.description.trim().is_empty() {
        println!("\nDescription:\n{}", book.description.trim());
    }

    match book.audiobook_format() {
        Some(format) if format.has_chapters() => {
            let chapters = ChapterList::from_format(format);
            println!("\nChapters ({}):", chapters.chapter_count());
            for (index, chapter) in format.chapters.iter().enumerate() {
                let start = chapters.start_of(index).unwrap_or_default();
                println!(
                    "  {:>3}. {:<50} {:>9}  (starts {})",
                    chapter.number,
                    truncate(&chapter.display_title(), 50),
                    chapter.duration.as_clock(),
                    start.as_clock()
                );
            }
        }
        Some(_) => println!("\nNo chapters"),
        None => println!("\n{}", style("No audiobook version available").red()),
    }

    if let Some(record) = state.resume.get(&book.id) {
        println!(
            "\nResume at {} (chapter {})",
            record.position.as_clock(),
            record.chapter + 1
        );
    }

    let bookmarks = state.bookmarks.for_book(&book.id);
    if !bookmarks.is_empty() {
        println!("Bookmarks: {}", bookmarks.len());
    }
}

/// Resolve an app path and show the view it points at
pub async fn open_path(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("path")
        .map(|s| s.as_str())
        .unwrap_or("/");

    match resolve_route(path) {
        Route::Book(id) => show_book_detail(ctx, &id, false).await,
        Route::Catalog => {
            if path.trim_end_matches('/') != "" {
                log::info!("Unknown path {}, showing the catalog", path);
            }
            show_catalog(ctx, SearchFilters::default(), 1).await
        }
    }
}

/// Toggle favorite status of a book
pub fn toggle_favorite(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow!("Book ID is required"))?;
    let id = BookId::new(id.trim());
    let state = ctx.state()?;

    match state.favorites.toggle(&id) {
        Some(true) => println!("{} Added {} to favorites", style("✓").green().bold(), id),
        Some(false) => println!("{} Removed {} from favorites", style("✓").green().bold(), id),
        None => bail!("Could not update favorites; they were left unchanged"),
    }
    Ok(())
}

pub fn list_favorites(ctx: &AppContext) -> Result<()> {
    let state = ctx.state()?;
    let favorites = state.favorites.list();

    if favorites.is_empty() {
        println!("No favorites yet. Use 'favorite <id>' to add one.");
        return Ok(());
    }

    let recent = state.recent.list();
    println!("\n{} Favorites", style(favorites.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for id in favorites {
        match recent.iter().find(|r| r.id == id) {
            Some(book) => println!("  {}  {}", id, style(&book.title).bold()),
            None => println!("  {}", id),
        }
    }
    Ok(())
}

pub fn list_recent(ctx: &AppContext) -> Result<()> {
    let state = ctx.state()?;
    let recent = state.recent.list();

    if recent.is_empty() {
        println!("No recently opened books.");
        return Ok(());
    }

    println!("\n{}", style("Recently opened").bold().cyan());
    println!("{}", "=".repeat(80));
    for (n, book) in recent.iter().enumerate() {
        print!("  {}. {} ", n + 1, style(&book.title).bold());
        if !book.authors.is_empty() {
            print!("by {} ", book.authors.join(", "));
        }
        println!("[{}]", book.id);
    }
    Ok(())
}

pub async fn bookmark(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("add", sub)) => add_bookmark(ctx, sub).await,
        Some(("list", sub)) => list_bookmarks(ctx, sub),
        Some(("remove", sub)) => remove_bookmark(ctx, sub),
        _ => list_bookmarks(ctx, matches),
    }
}

async fn add_bookmark(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let id = BookId::new(required(matches, "id")?.trim());
    let state = ctx.state()?;

    let (chapter, position) = match matches.get_one::<String>("at") {
        Some(at) => {
            let position = parse_position(at)?;
            let catalog = ctx.catalog().await?;
            let book = catalog.book(&id).await.map_err(report)?;
            let chapter = book
                .audiobook_format()
                .map(ChapterList::from_format)
                .and_then(|chapters| chapters.index_at(position))
                .unwrap_or(0);
            (chapter, position)
        }
        None => {
            let record = state
                .resume
                .get(&id)
                .ok_or_else(|| anyhow!("No saved position for {}; pass --at", id))?;
            (record.chapter, record.position)
        }
    };

    let mut bookmark = Bookmark::new(id.clone(), chapter, position);
    if let Some(note) = matches.get_one::<String>("note") {
        bookmark = bookmark.with_note(note.trim());
    }

    if !state.bookmarks.add(bookmark) {
        bail!("Could not save bookmark for {}", id);
    }
    println!(
        "{} Bookmarked {} at {} (chapter {})",
        style("✓").green().bold(),
        id,
        position.as_clock(),
        chapter + 1
    );
    Ok(())
}

fn list_bookmarks(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let state = ctx.state()?;
    let bookmarks = match matches.try_get_one::<String>("id").ok().flatten() {
        Some(id) => state.bookmarks.for_book(&BookId::new(id.trim())),
        None => state.bookmarks.all(),
    };

    if bookmarks.is_empty() {
        println!("No bookmarks.");
        return Ok(());
    }

    println!("\n{} Bookmarks", style(bookmarks.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for bookmark in bookmarks {
        print!(
            "  {}  {:>9}  chapter {}",
            bookmark.book_id,
            bookmark.position.as_clock(),
            bookmark.chapter + 1
        );
        match &bookmark.note {
            Some(note) if bookmark.has_note() => println!("  {}", style(note).dim()),
            _ => println!(),
        }
    }
    Ok(())
}

fn remove_bookmark(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let id = BookId::new(required(matches, "id")?.trim());
    let position = parse_position(required(matches, "at")?)?;
    let state = ctx.state()?;

    if state.bookmarks.remove(&id, position) {
        println!("{} Removed bookmark at {}", style("✓").green().bold(), position.as_clock());
    } else {
        println!("No bookmark for {} at {}", id, position.as_clock());
    }
    Ok(())
}

pub fn resume(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let state = ctx.state()?;

    match matches.subcommand() {
        Some(("clear", sub)) => {
            if sub.get_flag("all") {
                state.resume.clear_all();
                println!("{} Cleared every saved position", style("✓").green().bold());
                return Ok(());
            }
            let id = BookId::new(required(sub, "id")?.trim());
            if state.resume.clear(&id) {
                println!("{} Cleared saved position for {}", style("✓").green().bold(), id);
            } else {
                println!("No saved position for {}", id);
            }
            Ok(())
        }
        Some(("show", sub)) => show_resume(&state, sub.get_one::<String>("id")),
        _ => show_resume(&state, None),
    }
}

fn show_resume(state: &ClientState, id: Option<&String>) -> Result<()> {
    let records: Vec<ResumeRecord> = match id {
        Some(id) => state
            .resume
            .get(&BookId::new(id.trim()))
            .into_iter()
            .collect(),
        None => state.resume.all(),
    };

    if records.is_empty() {
        println!("No saved positions.");
        return Ok(());
    }

    let last = state.resume.last_played();
    let now = Timestamp::now();
    println!("\n{}", style("Saved positions").bold().cyan());
    println!("{}", "=".repeat(80));
    for record in records {
        let marker = if last.as_ref() == Some(&record.book_id) { "▶" } else { " " };
        println!(
            "{} {}  {:>9}  chapter {}  {}",
            marker,
            record.book_id,
            record.position.as_clock(),
            record.chapter + 1,
            style(format_ago(record.last_played, now)).dim()
        );
    }
    Ok(())
}

pub fn theme(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let state = ctx.state()?;

    match matches.subcommand() {
        Some(("set", sub)) => {
            let theme = required(sub, "theme")?
                .parse::<Theme>()
                .map_err(|e| anyhow!(e))?;
            if !state.theme.set(theme) {
                bail!("Could not save theme");
            }
            println!("{} Theme set to {}", style("✓").green().bold(), theme);
        }
        _ => {
            let current = state.theme.get_or(ctx.config.app.default_theme);
            for theme in Theme::ALL {
                if theme == current {
                    println!("{} {}", style("●").green(), style(theme).bold());
                } else {
                    println!("○ {}", theme);
                }
            }
        }
    }
    Ok(())
}

pub fn config(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            if ctx.manager.initialize().context("Failed to initialize config")? {
                println!(
                    "{} Wrote default config to {}",
                    style("✓").green().bold(),
                    ctx.manager.config_path().display()
                );
            } else {
                println!("Config already exists at {}", ctx.manager.config_path().display());
            }
        }
        Some(("reset", _)) => {
            ctx.manager.reset().context("Failed to reset config")?;
            println!("{} Config reset to defaults", style("✓").green().bold());
        }
        Some(("restore", _)) => {
            if ctx
                .manager
                .restore_backup()
                .context("Failed to restore config backup")?
            {
                println!("{} Config restored from backup", style("✓").green().bold());
            } else {
                bail!("No config backup to restore");
            }
        }
        Some(("validate", _)) => {
            let errors = ctx.manager.validate().context("Failed to read config")?;
            if errors.is_empty() {
                println!("{} Config is valid", style("✓").green().bold());
            } else {
                for error in &errors {
                    println!("{} {}", style("✗").red().bold(), error);
                }
                bail!("{} invalid setting(s)", errors.len());
            }
        }
        _ => {
            println!("# {}", ctx.manager.config_path().display());
            let text = toml::to_string_pretty(&ctx.config).context("Failed to render config")?;
            println!("{}", text);
            if let Err(errors) = ctx.config.validate() {
                for error in errors {
                    println!("# {} {}", style("warning:").yellow(), error);
                }
            }
        }
    }
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .ok_or_else(|| anyhow!("{} is required", name))
}

/// Parses "SS", "M:SS" or "H:MM:SS"
pub fn parse_position(text: &str) -> Result<Duration> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        bail!("Invalid position '{}': expected SS, M:SS or H:MM:SS", text);
    }

    let mut seconds: u64 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: u64 = part
            .parse()
            .with_context(|| format!("Invalid position '{}': expected SS, M:SS or H:MM:SS", text))?;
        if i > 0 && value >= 60 {
            bail!("Invalid position '{}': minutes and seconds must be below 60", text);
        }
        seconds = seconds * 60 + value;
    }
    Ok(Duration::from_seconds(seconds))
}

/// Page strip with the current page bracketed, e.g. `1 ... 4 [5] 6 ... 12`
pub fn format_page_strip(current: u32, total_pages: u32) -> String {
    page_numbers(current, total_pages)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(n) if n == current => format!("[{}]", n),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_ago(then: Timestamp, now: Timestamp) -> String {
    let elapsed = then.until(now).as_seconds();
    match elapsed {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", elapsed / 60),
        3600..=86_399 => format!("{}h ago", elapsed / 3600),
        _ => format!("{}d ago", elapsed / 86_400),
    }
}

fn print_book_summary(book: &Book, favorite: bool) {
    println!("\n{}", style(&book.title).bold());
    if !book.authors.is_empty() {
        println!("  by {}", book.author_names().join(", "));
    }
    if !book.narrators.is_empty() {
        println!("  read by {}", book.narrator_names().join(", "));
    }
    print!("  ID: {} | Duration: {}", book.id, book.duration);
    if !book.genres.is_empty() {
        print!(" | {}", book.genres.join(", "));
    }
    if favorite {
        print!("  {}", style("★").yellow());
    }
    println!();
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests;
