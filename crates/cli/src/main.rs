use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use context::AppContext;
use std::path::PathBuf;

mod commands;
mod context;
mod player;

fn build_cli() -> Command {
    Command::new("audioteca")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Audioteca Contributors")
        .about("Browse an audiobook catalog and listen chapter by chapter")
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .value_name("CATALOG_JSON")
                .help("Serve the catalog from a local JSON file instead of the API")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("catalog")
                .about("Search the catalog")
                .arg(Arg::new("query").short('q').long("query").value_name("TEXT").help("Search text"))
                .arg(
                    Arg::new("type")
                        .short('t')
                        .long("type")
                        .value_name("FIELD")
                        .help("Field to search")
                        .value_parser(["all", "title", "author", "narrator", "genre"])
                        .default_value("all"),
                )
                .arg(
                    Arg::new("page")
                        .short('p')
                        .long("page")
                        .value_name("N")
                        .help("Results page")
                        .value_parser(value_parser!(u32).range(1..))
                        .default_value("1"),
                ),
        )
        .subcommand(
            Command::new("book")
                .about("Show details of a book")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Catalog ID"))
                .arg(Arg::new("json").long("json").help("Print the book as JSON").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("play")
                .about("Play an audiobook")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Catalog ID"))
                .arg(
                    Arg::new("chapter")
                        .short('c')
                        .long("chapter")
                        .value_name("N")
                        .help("Start at chapter N (1-based)")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("sleep")
                        .short('s')
                        .long("sleep")
                        .value_name("MINUTES")
                        .help("Pause after this many minutes")
                        .value_parser(value_parser!(u32).range(1..)),
                )
                .arg(
                    Arg::new("from-start")
                        .long("from-start")
                        .help("Ignore the saved position")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("simulate-failures")
                        .long("simulate-failures")
                        .value_name("N")
                        .hide(true)
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("open")
                .about("Open an app path such as / or /book/<id>")
                .arg(Arg::new("path").value_name("PATH").default_value("/")),
        )
        .subcommand(
            Command::new("favorite")
                .about("Add a book to favorites, or remove it if already there")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID").help("Catalog ID")),
        )
        .subcommand(Command::new("favorites").about("List favorite books"))
        .subcommand(Command::new("recent").about("List recently opened books"))
        .subcommand(
            Command::new("bookmark")
                .about("Manage bookmarks")
                .subcommand(
                    Command::new("add")
                        .about("Bookmark a position (the saved position by default)")
                        .arg(Arg::new("id").required(true).value_name("BOOK_ID"))
                        .arg(Arg::new("at").long("at").value_name("POSITION").help("H:MM:SS, M:SS or seconds"))
                        .arg(Arg::new("note").short('n').long("note").value_name("TEXT")),
                )
                .subcommand(
                    Command::new("list")
                        .about("List bookmarks")
                        .arg(Arg::new("id").value_name("BOOK_ID")),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Remove the bookmark at a position")
                        .arg(Arg::new("id").required(true).value_name("BOOK_ID"))
                        .arg(Arg::new("at").required(true).value_name("POSITION")),
                ),
        )
        .subcommand(
            Command::new("resume")
                .about("Show or clear saved positions")
                .subcommand(
                    Command::new("show")
                        .about("Show saved positions")
                        .arg(Arg::new("id").value_name("BOOK_ID")),
                )
                .subcommand(
                    Command::new("clear")
                        .about("Forget a saved position")
                        .arg(Arg::new("id").value_name("BOOK_ID").required_unless_present("all"))
                        .arg(Arg::new("all").long("all").help("Forget every saved position").action(ArgAction::SetTrue)),
                ),
        )
        .subcommand(
            Command::new("theme")
                .about("Show or change the colour theme")
                .subcommand(
                    Command::new("set")
                        .about("Change the theme")
                        .arg(
                            Arg::new("theme")
                                .required(true)
                                .value_parser(["light", "dark", "darker", "sepia"]),
                        ),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand(Command::new("init").about("Write the default config if none exists"))
                .subcommand(Command::new("show").about("Print the effective config"))
                .subcommand(Command::new("reset").about("Overwrite the config with defaults"))
                .subcommand(Command::new("restore").about("Put back the config saved before the last overwrite"))
                .subcommand(Command::new("validate").about("Check the config file")),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let config_dir = matches.get_one::<PathBuf>("config-dir").cloned();
    let data = matches.get_one::<PathBuf>("data").cloned();
    let (ctx, warning) = AppContext::load(config_dir, data)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(ctx.config.app.log_level.as_str()),
    )
    .init();
    if let Some(warning) = warning {
        log::warn!("{}", warning);
    }

    match matches.subcommand() {
        Some(("catalog", sub_matches)) => commands::browse_catalog(&ctx, sub_matches).await,
        Some(("book", sub_matches)) => commands::show_book(&ctx, sub_matches).await,
        Some(("play", sub_matches)) => player::play_book(&ctx, sub_matches).await,
        Some(("open", sub_matches)) => commands::open_path(&ctx, sub_matches).await,
        Some(("favorite", sub_matches)) => commands::toggle_favorite(&ctx, sub_matches),
        Some(("favorites", _)) => commands::list_favorites(&ctx),
        Some(("recent", _)) => commands::list_recent(&ctx),
        Some(("bookmark", sub_matches)) => commands::bookmark(&ctx, sub_matches).await,
        Some(("resume", sub_matches)) => commands::resume(&ctx, sub_matches),
        Some(("theme", sub_matches)) => commands::theme(&ctx, sub_matches),
        Some(("config", sub_matches)) => commands::config(&ctx, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}
