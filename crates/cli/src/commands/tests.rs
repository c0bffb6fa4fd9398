use super::*;
use audioteca_config::{Config, ConfigManager};
use clap::{Arg, ArgAction, Command};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

fn catalog_json() -> serde_json::Value {
    let entry = |title: &str, author: &str, genre: &str| {
        json!({
            "title": title,
            "authors": [author],
            "narrators": [{"name": "Ana Ruiz"}],
            "genres": [genre],
            "language": "es",
            "formats": [{
                "type": "abook",
                "durationInMilliseconds": 750000,
                "chapters": [
                    {"number": 1, "title": "Uno", "durationInMilliseconds": 300000},
                    {"number": 2, "title": "Dos", "durationInMilliseconds": 450000}
                ]
            }],
            "duration": {"hours": 0, "minutes": 12, "seconds": 30}
        })
    };
    json!({
        "b1": entry("El camino", "Miguel Delibes", "Novela"),
        "b2": entry("Los santos inocentes", "Miguel Delibes", "Novela"),
        "b3": entry("Niebla", "Miguel de Unamuno", "Clásicos")
    })
}

fn setup_context() -> (TempDir, AppContext) {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let catalog_path = temp_dir.path().join("catalog.json");
    std::fs::write(&catalog_path, catalog_json().to_string()).expect("Should write catalog");

    let mut config = Config::default();
    config.app.data_dir = Some(temp_dir.path().join("data"));
    let manager = ConfigManager::with_directory(temp_dir.path().join("config"));

    let ctx = AppContext::new(manager, config, Some(catalog_path));
    (temp_dir, ctx)
}

fn id_matches(args: &[&str]) -> ArgMatches {
    Command::new("test")
        .arg(Arg::new("id").required(true))
        .arg(Arg::new("json").long("json").action(ArgAction::SetTrue))
        .arg(Arg::new("at").long("at"))
        .arg(Arg::new("note").long("note"))
        .try_get_matches_from(std::iter::once("test").chain(args.iter().copied()))
        .expect("Should parse test args")
}

#[test]
fn test_resolve_route_book_paths() {
    assert_eq!(resolve_route("/book/b1"), Route::Book(BookId::new("b1")));
    assert_eq!(resolve_route("/audiobook/b2/"), Route::Book(BookId::new("b2")));
    assert_eq!(resolve_route("book/b3?from=search"), Route::Book(BookId::new("b3")));
}

#[test]
fn test_resolve_route_falls_back_to_catalog() {
    assert_eq!(resolve_route("/"), Route::Catalog);
    assert_eq!(resolve_route(""), Route::Catalog);
    assert_eq!(resolve_route("/book"), Route::Catalog);
    assert_eq!(resolve_route("/book/b1/extra"), Route::Catalog);
    assert_eq!(resolve_route("/settings"), Route::Catalog);
}

#[test]
fn test_parse_position_formats() {
    assert_eq!(parse_position("90").expect("Should parse"), Duration::from_seconds(90));
    assert_eq!(parse_position("1:30").expect("Should parse"), Duration::from_seconds(90));
    assert_eq!(
        parse_position("1:02:03").expect("Should parse"),
        Duration::from_seconds(3723)
    );
}

#[test]
fn test_parse_position_rejects_garbage() {
    assert!(parse_position("").is_err());
    assert!(parse_position("1:75").is_err());
    assert!(parse_position("a:10").is_err());
    assert!(parse_position("1:2:3:4").is_err());
}

#[test]
fn test_format_page_strip_marks_current() {
    assert_eq!(format_page_strip(1, 1), "[1]");
    assert_eq!(format_page_strip(6, 12), "1 ... 4 5 [6] 7 8 ... 12");
    assert_eq!(format_page_strip(5, 12), "1 2 3 4 [5] 6 7 ... 12");
    assert_eq!(format_page_strip(1, 3), "[1] 2 3");
}

#[test]
fn test_format_ago() {
    let now = Timestamp::from_millis(10_000_000);
    assert_eq!(format_ago(Timestamp::from_millis(9_990_000), now), "just now");
    assert_eq!(format_ago(Timestamp::from_millis(9_700_000), now), "5m ago");
    assert_eq!(format_ago(Timestamp::from_millis(2_800_000), now), "2h ago");
}

#[test]
fn test_truncate_counts_characters() {
    assert_eq!(truncate("Niebla", 10), "Niebla");
    assert_eq!(truncate("Capítulo primero", 8), "Capít...");
}

#[tokio::test]
async fn test_show_book_adds_to_recent() {
    let (_temp, ctx) = setup_context();

    show_book(&ctx, &id_matches(&["b2"]))
        .await
        .expect("Should show book");
    show_book(&ctx, &id_matches(&["b1", "--json"]))
        .await
        .expect("Should show book");

    let recent = ctx.state().expect("Should open state").recent.list();
    let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["b1", "b2"]);
    assert_eq!(recent[0].title, "El camino");
}

#[tokio::test]
async fn test_show_missing_book_is_not_found() {
    let (_temp, ctx) = setup_context();

    let err = show_book(&ctx, &id_matches(&["nope"]))
        .await
        .expect_err("Should fail");
    let app = err
        .downcast_ref::<audioteca_core::AppError>()
        .expect("Should carry an AppError");
    assert!(matches!(app, audioteca_core::AppError::BookNotFound { .. }));
}

#[tokio::test]
async fn test_open_path_routes() {
    let (_temp, ctx) = setup_context();
    let open = |path: &str| {
        Command::new("test")
            .arg(Arg::new("path").default_value("/"))
            .try_get_matches_from(["test", path])
            .expect("Should parse")
    };

    open_path(&ctx, &open("/audiobook/b3"))
        .await
        .expect("Should open detail");
    open_path(&ctx, &open("/somewhere/else"))
        .await
        .expect("Should fall back to catalog");

    let recent = ctx.state().expect("Should open state").recent.list();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id, BookId::new("b3"));
}

#[tokio::test]
async fn test_browse_catalog_rejects_unknown_type() {
    let (_temp, ctx) = setup_context();
    let matches = Command::new("test")
        .arg(Arg::new("query").long("query"))
        .arg(Arg::new("type").long("type"))
        .arg(Arg::new("page").long("page").value_parser(clap::value_parser!(u32)))
        .try_get_matches_from(["test", "--query", "delibes", "--type", "publisher"])
        .expect("Should parse");

    assert!(browse_catalog(&ctx, &matches).await.is_err());
}

#[test]
fn test_toggle_favorite_twice() {
    let (_temp, ctx) = setup_context();

    toggle_favorite(&ctx, &id_matches(&["b1"])).expect("Should add");
    let state = ctx.state().expect("Should open state");
    assert!(state.favorites.is_favorite(&BookId::new("b1")));

    toggle_favorite(&ctx, &id_matches(&["b1"])).expect("Should remove");
    assert!(!state.favorites.is_favorite(&BookId::new("b1")));
}

#[tokio::test]
async fn test_bookmark_at_explicit_position_uses_chapter() {
    let (_temp, ctx) = setup_context();

    add_bookmark(&ctx, &id_matches(&["b1", "--at", "6:00", "--note", "  favourite line "]))
        .await
        .expect("Should add bookmark");

    let bookmarks = ctx
        .state()
        .expect("Should open state")
        .bookmarks
        .for_book(&BookId::new("b1"));
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].position, Duration::from_seconds(360));
    assert_eq!(bookmarks[0].chapter, 1);
    assert_eq!(bookmarks[0].note.as_deref(), Some("favourite line"));
}

#[tokio::test]
async fn test_bookmark_defaults_to_saved_position() {
    let (_temp, ctx) = setup_context();
    let state = ctx.state().expect("Should open state");
    let id = BookId::new("b2");

    assert!(add_bookmark(&ctx, &id_matches(&["b2"])).await.is_err());

    state.resume.record(&id, 0, Duration::from_seconds(42));
    add_bookmark(&ctx, &id_matches(&["b2"]))
        .await
        .expect("Should add bookmark");

    let bookmarks = state.bookmarks.for_book(&id);
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0].position, Duration::from_seconds(42));

    remove_bookmark(&ctx, &id_matches(&["b2", "--at", "42"])).expect("Should remove");
    assert!(state.bookmarks.for_book(&id).is_empty());
}

#[test]
fn test_theme_falls_back_to_config_default() {
    let (_temp, mut ctx) = setup_context();
    ctx.config.app.default_theme = Theme::Sepia;
    let state = ctx.state().expect("Should open state");
    assert_eq!(state.theme.get_or(ctx.config.app.default_theme), Theme::Sepia);

    let matches = Command::new("test")
        .subcommand(Command::new("set").arg(Arg::new("theme").required(true)))
        .try_get_matches_from(["test", "set", "light"])
        .expect("Should parse");
    theme(&ctx, &matches).expect("Should set theme");
    assert_eq!(state.theme.get_or(ctx.config.app.default_theme), Theme::Light);
}

#[test]
fn test_config_init_then_validate() {
    let (temp, ctx) = setup_context();
    let sub = |name: &str| {
        Command::new("test")
            .subcommand(Command::new("init"))
            .subcommand(Command::new("validate"))
            .try_get_matches_from(["test", name])
            .expect("Should parse")
    };

    config(&ctx, &sub("init")).expect("Should init");
    assert!(temp.path().join("config").join("config.toml").exists());
    config(&ctx, &sub("validate")).expect("Default config should be valid");
}

#[test]
fn test_config_restore_brings_back_previous_file() {
    let (_temp, ctx) = setup_context();
    let sub = |name: &str| {
        Command::new("test")
            .subcommand(Command::new("reset"))
            .subcommand(Command::new("restore"))
            .try_get_matches_from(["test", name])
            .expect("Should parse")
    };

    assert!(config(&ctx, &sub("restore")).is_err());

    ctx.manager
        .update(|c| c.catalog.per_page = 7)
        .expect("Should save custom config");
    config(&ctx, &sub("reset")).expect("Should reset");
    assert_eq!(ctx.manager.load().expect("Should load").catalog.per_page, 20);

    config(&ctx, &sub("restore")).expect("Should restore");
    assert_eq!(ctx.manager.load().expect("Should load").catalog.per_page, 7);
}

#[test]
fn test_resume_clear_all() {
    let (_temp, ctx) = setup_context();
    let state = ctx.state().expect("Should open state");
    state.resume.record(&BookId::new("b1"), 1, Duration::from_seconds(400));
    state.resume.record(&BookId::new("b2"), 0, Duration::from_seconds(10));

    let matches = Command::new("test")
        .subcommand(
            Command::new("clear")
                .arg(Arg::new("id"))
                .arg(Arg::new("all").long("all").action(ArgAction::SetTrue)),
        )
        .try_get_matches_from(["test", "clear", "--all"])
        .expect("Should parse");
    resume(&ctx, &matches).expect("Should clear");

    assert!(state.resume.all().is_empty());
}

#[test]
fn test_state_lives_under_configured_data_dir() {
    let (temp, ctx) = setup_context();
    let state = ctx.state().expect("Should open state");
    state.favorites.toggle(&BookId::new("b1"));

    let data: PathBuf = temp.path().join("data");
    assert!(data.join("favorites.json").exists());
}
