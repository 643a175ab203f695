use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use atty::Stream;
use clap::{Parser, Subcommand, ValueEnum};
use crumb_gloss::assistant::{AssistantClient, AssistantConfig, Conversation, DEFAULT_ENDPOINT};
use crumb_gloss::export::ExportFormat;
use crumb_gloss::learned::{JsonFileStore, LEARNED_KEY};
use crumb_gloss::lookup::{self, TermProjection};
use crumb_gloss::resources;
use crumb_gloss::widgets::{BakersPercentages, celsius_to_fahrenheit, fahrenheit_to_celsius};
use crumb_gloss::{
    ContentStore, FilterState, FilterUpdate, GlossaryRecord, LearningLink, PresentationController,
    TermLinks, filter,
};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "crumb-gloss", about = "Explore the bread-baking glossary", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding learned-term state.
    #[arg(long, global = true, env = "CRUMB_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List terms, narrowed by any combination of filters.
    List(ListArgs),
    /// Show the full entry for a term id.
    Show {
        /// Term id, e.g. `poolish`.
        id: String,
    },
    /// List the categories present in the glossary.
    Categories,
    /// List difficulty levels, easiest first.
    Difficulties,
    /// Show which alphabet letters have terms.
    Letters,
    /// List the curated learning paths.
    Paths,
    /// Show or change the terms you have learned.
    Learned {
        #[command(subcommand)]
        action: Option<LearnedCommand>,
    },
    /// Scale a dough by baker's percentages.
    Calc {
        /// Flour weight in grams.
        #[arg(long, default_value_t = 1000.0)]
        flour: f64,
        /// Hydration as a percentage of flour weight.
        #[arg(long, default_value_t = 75.0)]
        hydration: f64,
    },
    /// Convert an oven or dough temperature.
    Temp {
        #[arg(long, conflicts_with = "fahrenheit", required_unless_present = "fahrenheit")]
        celsius: Option<f64>,
        #[arg(long)]
        fahrenheit: Option<f64>,
    },
    /// Ask the baking assistant. Without a message, starts an interactive chat.
    Chat {
        message: Option<String>,
        /// Assistant endpoint.
        #[arg(long, env = "CRUMB_ASSISTANT_URL", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
        /// Request timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Run the web front end.
    #[cfg(feature = "web")]
    Serve {
        #[arg(long, env = "CRUMB_ADDR", default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL used in canonical links and the sitemap.
        #[arg(long, env = "CRUMB_BASE_URL")]
        base_url: Option<String>,
        #[arg(long, env = "CRUMB_ASSISTANT_URL", default_value = DEFAULT_ENDPOINT)]
        assistant_url: String,
        /// Maximum number of live browser sessions.
        #[arg(long, default_value_t = crumb_gloss::sessions::DEFAULT_MAX_SESSIONS)]
        max_sessions: usize,
    },
}

#[derive(Subcommand, Debug)]
enum LearnedCommand {
    /// Mark a term as learned, or unmark it.
    Toggle { id: String },
}

#[derive(clap::Args, Debug, Default)]
struct ListArgs {
    /// Case-insensitive match on term or definition.
    #[arg(short, long)]
    search: Option<String>,
    #[arg(short, long)]
    category: Option<String>,
    #[arg(short, long)]
    difficulty: Option<String>,
    /// Initial letter, or `#` for digits.
    #[arg(short, long)]
    letter: Option<String>,
    /// Restrict to a learning path id.
    #[arg(short, long)]
    path: Option<String>,
    /// Print only the term column.
    #[arg(long)]
    quick: bool,
    #[arg(long, value_enum, default_value_t = ListFormat::Table)]
    format: ListFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ListFormat {
    #[default]
    Table,
    Json,
    Csv,
    Md,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let content = Arc::new(ContentStore::bundled()?);
    match cli.command {
        Command::List(args) => handle_list(&content, args, cli.json),
        Command::Show { id } => handle_show(&content, &id, cli.json),
        Command::Categories => {
            print_names("CATEGORY", &filter::categories(content.records()), cli.json)
        }
        Command::Difficulties => {
            print_names("DIFFICULTY", &filter::difficulties(content.records()), cli.json)
        }
        Command::Letters => handle_letters(&content, cli.json),
        Command::Paths => handle_paths(&content, cli.json),
        Command::Learned { action } => handle_learned(content, cli.state_dir, action, cli.json),
        Command::Calc { flour, hydration } => handle_calc(flour, hydration, cli.json),
        Command::Temp {
            celsius,
            fahrenheit,
        } => handle_temp(celsius, fahrenheit, cli.json),
        Command::Chat {
            message,
            endpoint,
            timeout,
        } => {
            init_tracing();
            let config = AssistantConfig {
                endpoint,
                timeout: timeout.map(Duration::from_secs),
            };
            runtime()?.block_on(handle_chat(config, message))
        }
        #[cfg(feature = "web")]
        Command::Serve {
            addr,
            base_url,
            assistant_url,
            max_sessions,
        } => {
            init_tracing();
            let config = crumb_gloss::web::WebConfig {
                addr,
                base_url: base_url.unwrap_or_else(|| format!("http://{addr}")),
                assistant: AssistantConfig {
                    endpoint: assistant_url,
                    timeout: None,
                },
                state_dir: cli.state_dir,
                max_sessions,
            };
            runtime()?.block_on(crumb_gloss::web::serve(config))?;
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

fn filters_from(args: &ListArgs) -> FilterState {
    let mut state = FilterState::default();
    let fields = [
        ("search", &args.search),
        ("category", &args.category),
        ("difficulty", &args.difficulty),
        ("letter", &args.letter),
        ("path", &args.path),
    ];
    for (field, value) in fields {
        if let Some(update) = value
            .as_deref()
            .and_then(|value| FilterUpdate::parse(field, value))
        {
            state.apply(update);
        }
    }
    state.apply(FilterUpdate::QuickMode(args.quick));
    state
}

fn handle_list(content: &ContentStore, args: ListArgs, as_json: bool) -> Result<(), Box<dyn Error>> {
    if let Some(path) = args.path.as_deref() {
        if content.path(path).is_none() {
            eprintln!("warning: no learning path {path:?}; showing all paths");
        }
    }
    let state = filters_from(&args);
    let visible = content.visible(&state);
    let format = match (args.format, as_json) {
        (_, true) | (ListFormat::Json, _) => Some(ExportFormat::Json),
        (ListFormat::Csv, _) => Some(ExportFormat::Csv),
        (ListFormat::Md, _) => Some(ExportFormat::Markdown),
        (ListFormat::Table, false) => None,
    };
    match format {
        Some(format) => println!("{}", format.render(&visible)?),
        None => print_term_table(&visible, state.quick_mode),
    }
    Ok(())
}

fn handle_show(content: &ContentStore, id: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let projection = match lookup::project(content, id) {
        Ok(projection) => projection,
        Err(missing) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&missing)?);
            } else if !missing.suggestions.is_empty() {
                eprintln!("Did you mean: {}?", missing.suggestions.join(", "));
            }
            return Err(missing.message.into());
        }
    };
    if as_json {
        let mut payload = serde_json::to_value(&projection)?;
        if let Some(links) = content.term_links(&projection.slug) {
            payload["goDeeper"] = serde_json::to_value(links)?;
        }
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    let record = content
        .get(id)
        .ok_or_else(|| format!("No glossary term found with slug: {id}"))?;
    print_record(content, record, &projection);
    Ok(())
}

fn handle_letters(content: &ContentStore, as_json: bool) -> Result<(), Box<dyn Error>> {
    let buckets = filter::letter_buckets(content.records());
    let letters: Vec<_> = filter::alphabet()
        .into_iter()
        .filter(|label| label != filter::ALL)
        .map(|label| {
            let enabled = buckets.contains(&label);
            (label, enabled)
        })
        .collect();
    if as_json {
        let payload: Vec<_> = letters
            .iter()
            .map(|(letter, enabled)| json!({ "letter": letter, "hasTerms": enabled }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let line: Vec<String> = letters
            .iter()
            .map(|(letter, enabled)| {
                if *enabled {
                    letter.clone()
                } else {
                    "·".to_string()
                }
            })
            .collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

fn handle_paths(content: &ContentStore, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        let payload: Vec<_> = content
            .paths()
            .iter()
            .map(|path| {
                json!({
                    "id": path.id,
                    "title": path.title,
                    "description": path.description,
                    "termIds": content
                        .path_records(path)
                        .iter()
                        .map(|record| record.id.as_str())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if content.paths().is_empty() {
        println!("No learning paths.");
        return Ok(());
    }
    let width = content
        .paths()
        .iter()
        .map(|path| path.id.len())
        .max()
        .unwrap_or(2)
        .max("ID".len());
    println!("{:<width$}  {}", "ID", "TITLE", width = width);
    println!("{:-<width$}  {}", "", "-----", width = width);
    for path in content.paths() {
        let terms = content.path_records(path);
        println!(
            "{:<width$}  {} ({} terms)",
            path.id,
            path.title,
            terms.len(),
            width = width
        );
    }
    Ok(())
}

fn handle_learned(
    content: Arc<ContentStore>,
    state_dir: Option<PathBuf>,
    action: Option<LearnedCommand>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let store = JsonFileStore::new(state_dir.unwrap_or_else(JsonFileStore::default_dir))?;
    let mut controller = PresentationController::new(content, Arc::new(store), LEARNED_KEY);
    if let Some(LearnedCommand::Toggle { id }) = action {
        if !controller.content().contains(&id) {
            return Err(format!("No glossary term found with slug: {id}").into());
        }
        let learned = controller.toggle_learned(&id);
        if !as_json {
            let verb = if learned { "Learned" } else { "Unlearned" };
            println!("{verb}: {id}");
        }
    }
    let ids: Vec<&str> = controller.learned().iter().collect();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else if ids.is_empty() {
        println!("No learned terms yet.");
    } else {
        println!("{} of {} terms learned:", ids.len(), controller.content().len());
        for id in ids {
            let term = controller
                .content()
                .get(id)
                .map(|record| record.term.as_str())
                .unwrap_or("<unknown>");
            println!("- {term} ({id})");
        }
    }
    Ok(())
}

fn handle_calc(flour: f64, hydration: f64, as_json: bool) -> Result<(), Box<dyn Error>> {
    let result = BakersPercentages::compute(flour, hydration);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    println!("{:<8}  {:>6}", "PART", "GRAMS");
    println!("{:-<8}  {:->6}", "", "");
    for (label, grams) in [
        ("Flour", result.flour),
        ("Water", result.water),
        ("Salt", result.salt),
        ("Starter", result.starter),
        ("Total", result.total),
    ] {
        println!("{label:<8}  {grams:>6}");
    }
    Ok(())
}

fn handle_temp(
    celsius: Option<f64>,
    fahrenheit: Option<f64>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let (c, f) = match (celsius, fahrenheit) {
        (Some(c), _) => (c, celsius_to_fahrenheit(c)),
        (None, Some(f)) => (fahrenheit_to_celsius(f), f),
        (None, None) => return Err("Pass --celsius or --fahrenheit".into()),
    };
    if as_json {
        println!("{}", json!({ "celsius": c, "fahrenheit": f }));
    } else {
        println!("{c}°C = {f}°F");
    }
    Ok(())
}

async fn handle_chat(config: AssistantConfig, message: Option<String>) -> Result<(), Box<dyn Error>> {
    let client = AssistantClient::new(&config)?;
    let mut conversation = Conversation::default();
    if let Some(message) = message {
        if let Some(reply) = conversation.send(&client, &message).await {
            println!("{reply}");
        }
        return Ok(());
    }

    if let Some(welcome) = conversation.turns().first() {
        println!("{}\n", welcome.text);
    }
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        if let Some(reply) = conversation.send(&client, &line).await {
            render_markdown_block("Krusty", &reply);
            println!();
        }
    }
    Ok(())
}

fn print_names(header: &str, names: &[String], as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(names)?);
    } else {
        println!("{header}");
        println!("{:-<width$}", "", width = header.len());
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

fn print_term_table(records: &[&GlossaryRecord], quick: bool) {
    if records.is_empty() {
        println!("No terms match these filters.");
        return;
    }
    if quick {
        for record in records {
            println!("{}", record.term);
        }
        return;
    }
    let id_width = column_width(records, "ID", |record| record.id.len());
    let term_width = column_width(records, "TERM", |record| record.term.chars().count());
    let category_width = column_width(records, "CATEGORY", |record| record.category.len());
    println!(
        "{:<id_width$}  {:<term_width$}  {:<category_width$}  {}",
        "ID", "TERM", "CATEGORY", "DIFFICULTY"
    );
    println!(
        "{:-<id_width$}  {:-<term_width$}  {:-<category_width$}  {}",
        "", "", "", "----------"
    );
    for record in records {
        println!(
            "{:<id_width$}  {:<term_width$}  {:<category_width$}  {}",
            record.id, record.term, record.category, record.difficulty
        );
    }
}

fn column_width(
    records: &[&GlossaryRecord],
    header: &str,
    len: impl Fn(&GlossaryRecord) -> usize,
) -> usize {
    records
        .iter()
        .map(|record| len(record))
        .max()
        .unwrap_or(0)
        .max(header.len())
}

fn print_record(content: &ContentStore, record: &GlossaryRecord, projection: &TermProjection) {
    println!("{} ({})", projection.name, projection.slug);
    if let Some(pronunciation) = &projection.pronunciation {
        println!("Pronunciation: {pronunciation}");
    }
    println!(
        "Category: {} · Difficulty: {}",
        projection.category, projection.difficulty
    );
    if projection.featured_in_book {
        println!("Featured in the book.");
    }

    render_markdown_block("Definition", &projection.definition);

    if let Some(list) = format_list(&record.henrys_tips) {
        println!("\nHenry's Tips:\n{list}");
    }
    if let Some(list) = format_list(&projection.common_mistakes) {
        println!("\nCommon Mistakes:\n{list}");
    }
    if !record.troubleshooting.is_empty() {
        println!("\nTroubleshooting:");
        for item in &record.troubleshooting {
            println!("- {}: {}", item.problem, item.solution);
        }
    }
    if let Some(history) = &projection.history {
        render_markdown_block("History", history);
    }

    let related: Vec<_> = content
        .resolve_related(record)
        .iter()
        .map(|related| format!("{} ({})", related.term, related.id))
        .collect();
    if !related.is_empty() {
        println!("\nRelated: {}", related.join(", "));
    }
    let gear = resources::shop_links(record);
    if !gear.is_empty() {
        println!("\nRecommended Gear:");
        for tool in gear {
            println!("- {}: {}", tool.name, tool.url);
        }
    }
    println!("\nWatch: {}", resources::youtube_search_url(record));
    println!("Read:  {}", resources::blog_search_url(&record.term));
    if let Some(links) = content.term_links(&record.id) {
        println!("\n{}", format_go_deeper(links));
    }
}

fn format_go_deeper(links: &TermLinks) -> String {
    let mut out = String::from("Go Deeper:");
    let sections: [(&str, &[LearningLink]); 3] = [
        ("Video Tutorials", &links.youtube_videos),
        ("Academy Courses", &links.academy_courses),
        ("Practice Recipes", &links.pantry_recipes),
    ];
    for (heading, items) in sections {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n  {heading}:"));
        for link in items {
            out.push_str(&format!("\n  - {}: {}", link.title, link.url));
            if let Some(description) = &link.description {
                out.push_str(&format!("\n    {description}"));
            }
        }
    }
    out
}

fn format_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
