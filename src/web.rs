use crate::assistant::{AssistantClient, AssistantConfig, ChatRequest, ChatRole, ChatTurn};
use crate::export::ExportFormat;
use crate::filter::{self, ALL, FilterState, FilterUpdate, LetterFilter, Selection};
use crate::learned::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
use crate::lookup::{self, TermProjection};
use crate::presentation::{DetailTab, PresentationController, category_tone, difficulty_tone};
use crate::resources::{self, BOOK_URL, COMMUNITY_URL, STARTER_GUIDE_URL, encode_component};
use crate::sessions::{
    DEFAULT_MAX_SESSIONS, SessionRegistry, generate_session_id, is_valid_session_id,
};
use crate::widgets::{
    BakersPercentages, DEFAULT_FLOUR_GRAMS, DEFAULT_HYDRATION_PERCENT, celsius_to_fahrenheit,
    fahrenheit_to_celsius,
};
use crate::{
    ContentError, ContentStore, GlossaryRecord, LearningPath, MediaKind, TermLinks, ToolLink, Widget,
};
use askama::Html as HtmlEscaper;
use askama::{MarkupDisplay, Template};
use axum::{
    Json, Router,
    extract::{Form, Path, Query, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            AUTHORIZATION, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE,
        },
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use cookie::{Cookie, SameSite};
use markdown::{Options as MarkdownOptions, to_html_with_options};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<AppState>;
type SafeJson = MarkupDisplay<HtmlEscaper, String>;

pub const SESSION_COOKIE: &str = "crumb_session";
const TERM_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=86400";
const SITE_NAME: &str = "Crust & Crumb Glossary";
const BOOK_TITLE: &str = "Sourdough for the Rest of Us";

pub struct AppState {
    content: Arc<ContentStore>,
    sessions: SessionRegistry,
    assistant: AssistantClient,
    base_url: String,
}

impl AppState {
    pub fn new(
        content: Arc<ContentStore>,
        persistence: Arc<dyn KeyValueStore>,
        assistant: AssistantClient,
        base_url: impl Into<String>,
        max_sessions: usize,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(content.clone(), persistence, max_sessions),
            content,
            assistant,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub base_url: String,
    pub assistant: AssistantConfig,
    /// Where learned terms are written; in-memory only when unset.
    pub state_dir: Option<PathBuf>,
    pub max_sessions: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
            assistant: AssistantConfig::default(),
            state_dir: None,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("state store unavailable: {0}")]
    Store(#[from] StoreError),
    #[error("assistant client could not be built: {0}")]
    Assistant(#[from] reqwest::Error),
}

pub async fn serve(config: WebConfig) -> Result<(), WebError> {
    let content = Arc::new(ContentStore::bundled()?);
    let persistence: Arc<dyn KeyValueStore> = match &config.state_dir {
        Some(dir) => Arc::new(JsonFileStore::new(dir)?),
        None => Arc::new(MemoryStore::new()),
    };
    let assistant = AssistantClient::new(&config.assistant)?;
    let state = Arc::new(AppState::new(
        content,
        persistence,
        assistant,
        config.base_url.clone(),
        config.max_sessions,
    ));
    let router = build_router(state);
    info!(
        addr = %config.addr,
        base = %config.base_url,
        assistant = %config.assistant.endpoint,
        state_dir = ?config.state_dir,
        "Binding HTTP listener"
    );
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);
    let public_api = Router::new()
        .route("/api/term/:slug", get(api_term))
        .layer(cors);

    Router::new()
        .route("/", get(home))
        .route("/filter", post(set_filters))
        .route("/reset", post(reset_filters))
        .route("/quick", post(toggle_quick))
        .route("/expand/:id", post(toggle_expand))
        .route("/tab/:tab", post(select_tab))
        .route("/related/:id", post(jump_to_related))
        .route("/learned/:id", post(toggle_learned))
        .route("/chat", get(chat_page).post(chat_send))
        .route("/term/:slug", get(term_html))
        .route("/api/chat", post(api_chat))
        .route("/api/terms", get(api_terms))
        .route("/healthz", get(health))
        .route("/sitemap.xml", get(sitemap_xml))
        .merge(public_api)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// The browser's session id, minted when the request carries none we issued.
struct SessionCookie {
    id: String,
    fresh: bool,
}

impl SessionCookie {
    fn from_headers(headers: &HeaderMap) -> Self {
        let existing = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| Cookie::split_parse(raw).flatten())
            .find(|cookie| cookie.name() == SESSION_COOKIE && is_valid_session_id(cookie.value()))
            .map(|cookie| cookie.value().to_string());
        match existing {
            Some(id) => Self { id, fresh: false },
            None => Self {
                id: generate_session_id(),
                fresh: true,
            },
        }
    }

    fn attach(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.fresh {
            let cookie = Cookie::build((SESSION_COOKIE, self.id.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

fn anchor_for(id: &str) -> String {
    format!("/#term-{}", encode_component(id))
}

fn ask_prompt(term: &str) -> String {
    format!("Tell me more about {term} as explained in \"{BOOK_TITLE}\".")
}

fn ask_href(term: &str) -> String {
    format!("/chat?prompt={}", encode_component(&ask_prompt(term)))
}

#[derive(Debug, Default, Deserialize)]
struct WidgetParams {
    flour: Option<String>,
    hydration: Option<String>,
    celsius: Option<String>,
    fahrenheit: Option<String>,
    /// Which converter field was submitted: `c` or `f`.
    from: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPageParams {
    prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatForm {
    #[serde(default)]
    message: String,
}

fn parse_number(value: &Option<String>) -> Option<f64> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .and_then(|text| text.parse::<f64>().ok())
}

async fn home(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(widgets): Query<WidgetParams>,
) -> Response {
    let session = SessionCookie::from_headers(&headers);
    let (controller, highlight) = state.sessions.with_session(&session.id, |entry| {
        let highlight = entry.take_scroll().map(|signal| signal.target);
        (entry.controller.clone(), highlight)
    });
    let template = HomeTemplate::build(&controller, highlight.as_deref(), &widgets, &state.base_url);
    let html = template
        .render()
        .unwrap_or_else(|err| render_error_page(err.to_string()));
    session.attach(Html(html))
}

async fn set_filters(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let session = SessionCookie::from_headers(&headers);
    state.sessions.with_session(&session.id, |entry| {
        for (field, value) in &pairs {
            if let Some(update) = FilterUpdate::parse(field, value) {
                entry.controller.set_filter(update);
            }
        }
    });
    session.attach(Redirect::to("/"))
}

async fn reset_filters(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let session = SessionCookie::from_headers(&headers);
    state
        .sessions
        .with_session(&session.id, |entry| entry.controller.reset_all_filters());
    session.attach(Redirect::to("/"))
}

async fn toggle_quick(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let session = SessionCookie::from_headers(&headers);
    state
        .sessions
        .with_session(&session.id, |entry| entry.controller.toggle_quick_mode());
    session.attach(Redirect::to("/"))
}

async fn toggle_expand(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = SessionCookie::from_headers(&headers);
    state
        .sessions
        .with_session(&session.id, |entry| entry.controller.toggle_expand(&id));
    session.attach(Redirect::to(&anchor_for(&id)))
}

async fn select_tab(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(tab): Path<String>,
) -> Response {
    let session = SessionCookie::from_headers(&headers);
    let target = state.sessions.with_session(&session.id, |entry| {
        if let Some(tab) = DetailTab::parse(&tab) {
            entry.controller.select_tab(tab);
        }
        entry.controller.expanded_id().map(anchor_for)
    });
    session.attach(Redirect::to(target.as_deref().unwrap_or("/")))
}

async fn jump_to_related(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = SessionCookie::from_headers(&headers);
    let jumped = state.sessions.with_session(&session.id, |entry| {
        match entry.controller.jump_to_related(&id) {
            Some(signal) => {
                entry.set_scroll(signal);
                true
            }
            None => false,
        }
    });
    let location = if jumped { anchor_for(&id) } else { "/".to_string() };
    session.attach(Redirect::to(&location))
}

async fn toggle_learned(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let session = SessionCookie::from_headers(&headers);
    state
        .sessions
        .with_session(&session.id, |entry| entry.controller.toggle_learned(&id));
    session.attach(Redirect::to(&anchor_for(&id)))
}

async fn chat_page(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<ChatPageParams>,
) -> Response {
    let session = SessionCookie::from_headers(&headers);
    let conversation = state
        .sessions
        .with_session(&session.id, |entry| entry.conversation.clone());
    let template = ChatTemplate {
        site_name: SITE_NAME,
        lines: conversation.turns().iter().map(ChatLine::from).collect(),
        draft: params.prompt.as_deref().unwrap_or_default(),
    };
    let html = template
        .render()
        .unwrap_or_else(|err| render_error_page(err.to_string()));
    session.attach(Html(html))
}

/// The transcript is copied out so no lock is held while the assistant
/// answers. Concurrent sends from one session keep the last writer's copy.
async fn chat_send(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let session = SessionCookie::from_headers(&headers);
    let mut conversation = state
        .sessions
        .with_session(&session.id, |entry| entry.conversation.clone());
    if conversation
        .send(&state.assistant, &form.message)
        .await
        .is_some()
    {
        state
            .sessions
            .with_session(&session.id, |entry| entry.conversation = conversation);
    }
    session.attach(Redirect::to("/chat"))
}

async fn term_html(State(state): State<SharedState>, Path(slug): Path<String>) -> Response {
    let store = state.content.as_ref();
    let Some(record) = store.get(&slug) else {
        let message = match lookup::project(store, &slug) {
            Err(missing) if !missing.suggestions.is_empty() => format!(
                "{} Did you mean: {}?",
                missing.message,
                missing.suggestions.join(", ")
            ),
            Err(missing) => missing.message,
            Ok(_) => format!("No glossary term found with slug: {slug}"),
        };
        return (StatusCode::NOT_FOUND, Html(render_error_page(message))).into_response();
    };
    let projection = lookup::project_record(store, record);
    let template = TermTemplate {
        site_name: SITE_NAME,
        projection: &projection,
        record,
        canonical_url: absolute_term_url(&state.base_url, &record.id),
        json_ld: MarkupDisplay::new_safe(term_json_ld(record, &state.base_url), HtmlEscaper),
        definition_html: render_markdown(&record.definition),
        related: store.resolve_related(record),
        youtube_url: resources::youtube_search_url(record),
        blog_url: resources::blog_search_url(&record.term),
        category_tone: category_tone(&record.category).as_str(),
        difficulty_tone: difficulty_tone(&record.difficulty).as_str(),
    };
    Html(
        template
            .render()
            .unwrap_or_else(|err| render_error_page(err.to_string())),
    )
    .into_response()
}

async fn api_term(State(state): State<SharedState>, Path(slug): Path<String>) -> Response {
    match lookup::project(&state.content, &slug) {
        Ok(projection) => (
            [(CACHE_CONTROL, TERM_CACHE_CONTROL)],
            Json::<TermProjection>(projection),
        )
            .into_response(),
        Err(missing) => (StatusCode::NOT_FOUND, Json(missing)).into_response(),
    }
}

async fn api_chat(
    State(state): State<SharedState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("Field `message` cannot be empty"));
    }
    let reply = state.assistant.ask(&request.history, &request.message).await;
    Ok(Json(json!({ "response": reply })))
}

/// Stateless export of the records matching the query-string filters.
async fn api_terms(
    State(state): State<SharedState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let mut filters = FilterState::default();
    let mut format = None;
    for (field, value) in &pairs {
        if field == "format" {
            format = Some(value.parse::<ExportFormat>().map_err(ApiError::bad_request)?);
        } else if let Some(update) = FilterUpdate::parse(field, value) {
            filters.apply(update);
        }
    }
    let visible = state.content.visible(&filters);
    let chosen = format.unwrap_or(ExportFormat::Json);
    let body = chosen
        .render(&visible)
        .map_err(|err| ApiError::internal(err.to_string()))?;
    let mut response = ([(CONTENT_TYPE, chosen.mime_type())], body).into_response();
    if format.is_some() {
        let disposition = format!("attachment; filename=\"{}\"", chosen.file_name());
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            response.headers_mut().insert(CONTENT_DISPOSITION, value);
        }
    }
    Ok(response)
}

async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "crumb-gloss-web",
        "terms": state.content.len(),
        "sessions": state.sessions.len(),
    }))
}

async fn sitemap_xml(State(state): State<SharedState>) -> impl IntoResponse {
    let mut body = String::with_capacity(1024);
    body.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    body.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    let mut push_url = |loc: String, priority: &str| {
        body.push_str("<url><loc>");
        body.push_str(&xml_escape(&loc));
        body.push_str("</loc><changefreq>weekly</changefreq><priority>");
        body.push_str(priority);
        body.push_str("</priority></url>");
    };
    push_url(state.base_url.clone(), "0.8");
    for record in state.content.records() {
        push_url(absolute_term_url(&state.base_url, &record.id), "0.5");
    }
    body.push_str("</urlset>");
    ([(CONTENT_TYPE, "application/xml")], body)
}

fn term_path(id: &str) -> String {
    format!("/term/{}", encode_component(id))
}

fn absolute_term_url(base_url: &str, id: &str) -> String {
    format!("{}{}", base_url, term_path(id))
}

fn defined_term_set(base_url: &str) -> serde_json::Value {
    json!({
        "@type": "DefinedTermSet",
        "@id": format!("{base_url}/"),
        "name": SITE_NAME,
        "url": base_url,
    })
}

fn site_json_ld(base_url: &str, count: usize) -> String {
    let mut set = defined_term_set(base_url);
    set["@context"] = json!("https://schema.org");
    set["numberOfItems"] = json!(count);
    script_safe(serde_json::to_string_pretty(&set).unwrap_or_else(|_| "{}".to_string()))
}

fn term_json_ld(record: &GlossaryRecord, base_url: &str) -> String {
    let term_url = absolute_term_url(base_url, &record.id);
    let mut defined_term = json!({
        "@type": "DefinedTerm",
        "@id": term_url,
        "url": term_url,
        "name": record.term,
        "description": record.short_definition.as_deref().unwrap_or(&record.definition),
        "inDefinedTermSet": format!("{base_url}/"),
        "termCode": record.id,
        "mainEntityOfPage": term_url,
    });
    if let Some(alternate) = record.pronunciation.as_deref().filter(|p| !p.is_empty()) {
        defined_term["alternateName"] = json!(alternate);
    }
    let graph = vec![
        defined_term_set(base_url),
        defined_term,
        json!({
            "@type": "BreadcrumbList",
            "itemListElement": [
                { "@type": "ListItem", "position": 1, "name": "Glossary", "item": base_url },
                { "@type": "ListItem", "position": 2, "name": record.term, "item": term_url }
            ]
        }),
    ];
    script_safe(
        serde_json::to_string_pretty(&json!({
            "@context": "https://schema.org",
            "@graph": graph
        }))
        .unwrap_or_else(|_| "{}".to_string()),
    )
}

// JSON inside <script> must not close the element early.
fn script_safe(json: String) -> String {
    json.replace("</", "<\\/")
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn render_markdown(input: &str) -> String {
    let trimmed = input.trim();
    to_html_with_options(trimmed, &MarkdownOptions::gfm())
        .unwrap_or_else(|_| xml_escape(trimmed))
}

fn render_error_page(message: impl Into<String>) -> String {
    let template = ErrorTemplate {
        site_name: SITE_NAME,
        message: message.into(),
    };
    template
        .render()
        .unwrap_or_else(|_| "<h1>Something went wrong</h1>".to_string())
}

fn filter_query(filters: &FilterState) -> String {
    let mut parts = Vec::new();
    if !filters.search_text.is_empty() {
        parts.push(format!("search={}", encode_component(&filters.search_text)));
    }
    if let Selection::Only(category) = &filters.category {
        parts.push(format!("category={}", encode_component(category)));
    }
    if let Selection::Only(difficulty) = &filters.difficulty {
        parts.push(format!("difficulty={}", encode_component(difficulty)));
    }
    if let Some(path) = &filters.active_path_id {
        parts.push(format!("path={}", encode_component(path)));
    }
    if filters.selected_letter != LetterFilter::All {
        parts.push(format!(
            "letter={}",
            encode_component(filters.selected_letter.as_str())
        ));
    }
    parts.join("&")
}

struct OptionView {
    value: String,
    selected: bool,
}

struct PathView<'a> {
    path: &'a LearningPath,
    target: &'a str,
    active: bool,
    resolved: usize,
}

struct LetterView {
    label: String,
    enabled: bool,
    active: bool,
}

struct TabView {
    name: &'static str,
    label: &'static str,
    active: bool,
}

struct TemperatureView {
    celsius: String,
    fahrenheit: String,
}

struct ExportLink {
    label: &'static str,
    href: String,
}

struct QuickLink<'a> {
    label: &'static str,
    url: &'a str,
}

struct ChatLine<'a> {
    from_user: bool,
    text: &'a str,
}

impl<'a> From<&'a ChatTurn> for ChatLine<'a> {
    fn from(turn: &'a ChatTurn) -> Self {
        Self {
            from_user: turn.role == ChatRole::User,
            text: &turn.text,
        }
    }
}

struct DetailView<'a> {
    tabs: Vec<TabView>,
    tab: &'static str,
    definition_html: String,
    related: Vec<&'a GlossaryRecord>,
    gear: Vec<ToolLink>,
    youtube_url: String,
    blog_url: String,
    featured_in_book: bool,
    starter_related: bool,
    media: Vec<&'static str>,
    calculator: Option<BakersPercentages>,
    flour_input: String,
    hydration_input: String,
    converter: Option<TemperatureView>,
    go_deeper: Option<&'a TermLinks>,
}

struct CardView<'a> {
    record: &'a GlossaryRecord,
    summary: &'a str,
    category_tone: &'static str,
    difficulty_tone: &'static str,
    learned: bool,
    expanded: bool,
    highlighted: bool,
    quick_links: Vec<QuickLink<'a>>,
    ask_href: String,
    detail: Option<DetailView<'a>>,
}

impl<'a> DetailView<'a> {
    fn build(
        controller: &'a PresentationController,
        record: &'a GlossaryRecord,
        widgets: &WidgetParams,
    ) -> Self {
        let active = controller.active_tab();
        let has_expert = !record.henrys_tips.is_empty()
            || !record.common_mistakes.is_empty()
            || !record.troubleshooting.is_empty();
        let gear = resources::shop_links(record);
        let has_deep = record.history.is_some()
            || record.difficulty_explanation.is_some()
            || record.book_chapter.is_some()
            || !gear.is_empty()
            || !record.sources.is_empty();
        let has_recipes = !record.related_recipes.is_empty();
        let tabs = DetailTab::ALL
            .iter()
            .filter(|tab| match tab {
                DetailTab::Overview => true,
                DetailTab::Expert => has_expert,
                DetailTab::Deep => has_deep,
                DetailTab::Recipes => has_recipes,
            })
            .map(|tab| TabView {
                name: tab.as_str(),
                label: tab.label(),
                active: *tab == active,
            })
            .collect();

        let calculator = record.widgets.contains(&Widget::Calculator).then(|| {
            BakersPercentages::compute(
                parse_number(&widgets.flour).unwrap_or(DEFAULT_FLOUR_GRAMS),
                parse_number(&widgets.hydration).unwrap_or(DEFAULT_HYDRATION_PERCENT),
            )
        });
        let converter = record
            .widgets
            .contains(&Widget::Converter)
            .then(|| temperature_view(widgets));

        Self {
            tabs,
            tab: active.as_str(),
            definition_html: render_markdown(&record.definition),
            related: controller.content().resolve_related(record),
            gear,
            youtube_url: resources::youtube_search_url(record),
            blog_url: resources::blog_search_url(&record.term),
            featured_in_book: record
                .book_ref
                .as_ref()
                .is_some_and(|book_ref| book_ref.is_featured()),
            starter_related: record.starter_related.unwrap_or(false),
            media: record
                .media_placeholder
                .iter()
                .map(|kind| match kind {
                    MediaKind::Video => "Video Placeholder",
                    MediaKind::Image => "Image Placeholder",
                })
                .collect(),
            calculator,
            flour_input: widgets
                .flour
                .clone()
                .unwrap_or_else(|| DEFAULT_FLOUR_GRAMS.to_string()),
            hydration_input: widgets
                .hydration
                .clone()
                .unwrap_or_else(|| DEFAULT_HYDRATION_PERCENT.to_string()),
            converter,
            go_deeper: controller.content().term_links(&record.id),
        }
    }
}

/// Converts from the side named by `from`. Without it, or when that side is
/// blank, whichever side holds a number wins, Celsius first.
fn temperature_view(widgets: &WidgetParams) -> TemperatureView {
    let celsius = parse_number(&widgets.celsius);
    let fahrenheit = parse_number(&widgets.fahrenheit);
    let from_fahrenheit = widgets.from.as_deref() == Some("f") || celsius.is_none();
    match (celsius, fahrenheit) {
        (_, Some(fahrenheit)) if from_fahrenheit => TemperatureView {
            celsius: format!("{:.1}", fahrenheit_to_celsius(fahrenheit)),
            fahrenheit: format!("{fahrenheit}"),
        },
        (Some(celsius), _) => TemperatureView {
            celsius: format!("{celsius}"),
            fahrenheit: format!("{:.1}", celsius_to_fahrenheit(celsius)),
        },
        _ => TemperatureView {
            celsius: String::new(),
            fahrenheit: String::new(),
        },
    }
}

fn quick_links(links: &TermLinks) -> Vec<QuickLink<'_>> {
    [
        ("Watch Tutorial", links.youtube_videos.first()),
        ("Academy Course", links.academy_courses.first()),
        ("Practice Recipe", links.pantry_recipes.first()),
    ]
    .into_iter()
    .filter_map(|(label, link)| link.map(|link| QuickLink { label, url: &link.url }))
    .collect()
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ site_name }}</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    <link rel="canonical" href="{{ base_url }}/">
    <script type="application/ld+json">
    {{ json_ld }}
    </script>
  </head>
  <body class="bg-amber-50 text-slate-900">
    <main class="min-h-screen max-w-6xl mx-auto py-10 px-4 space-y-6">
      <header class="space-y-2">
        <p class="uppercase tracking-wide text-sm text-amber-700">Learn the language of bread</p>
        <form action="/reset" method="post">
          <h1 class="text-4xl font-extrabold tracking-tight"><button>{{ site_name }}</button></h1>
        </form>
        <p class="text-lg text-slate-600">{{ visible_count }} of {{ total_count }} terms shown · {{ learned_count }} learned · <a href="/chat" class="underline">Ask Krusty</a></p>
      </header>

      <section aria-label="Learning paths">
        <form action="/filter" method="post" class="grid gap-3 md:grid-cols-4">
          {% for path in paths %}
          <button name="path" value="{{ path.target }}" class="text-left rounded-xl border p-4 {% if path.active %}border-amber-500 bg-white shadow{% else %}border-amber-100 bg-white/60 hover:bg-white{% endif %}">
            <p class="font-semibold">{{ path.path.title }}</p>
            <p class="text-sm text-slate-600">{{ path.path.description }}</p>
            <p class="text-xs text-slate-500 mt-2">{{ path.resolved }} terms</p>
          </button>
          {% endfor %}
        </form>
      </section>

      <section class="flex flex-wrap gap-3 items-end" aria-label="Filters">
        <form action="/filter" method="post" class="flex gap-2">
          <input type="search" name="search" value="{{ search }}" placeholder="Search terms or definitions" class="border border-slate-300 rounded-lg px-3 py-2">
          <button class="rounded-lg bg-slate-900 px-4 py-2 text-white">Search</button>
        </form>
        <form action="/filter" method="post" class="flex gap-2">
          <select name="category" class="border border-slate-300 rounded-lg px-3 py-2">
            <option value="All">All categories</option>
            {% for option in categories %}
            <option value="{{ option.value }}"{% if option.selected %} selected{% endif %}>{{ option.value }}</option>
            {% endfor %}
          </select>
          <button class="rounded-lg bg-slate-200 px-3 py-2">Apply</button>
        </form>
        <form action="/filter" method="post" class="flex gap-2">
          <select name="difficulty" class="border border-slate-300 rounded-lg px-3 py-2">
            <option value="All">All levels</option>
            {% for option in difficulties %}
            <option value="{{ option.value }}"{% if option.selected %} selected{% endif %}>{{ option.value }}</option>
            {% endfor %}
          </select>
          <button class="rounded-lg bg-slate-200 px-3 py-2">Apply</button>
        </form>
        <form action="/quick" method="post">
          <button class="rounded-lg border px-3 py-2 {% if quick_mode %}bg-amber-600 text-white{% else %}bg-white{% endif %}">Quick mode</button>
        </form>
        {% if filtered %}
        <form action="/reset" method="post">
          <button class="rounded-lg border px-3 py-2 bg-white">Clear filters</button>
        </form>
        {% endif %}
        <span class="text-sm text-slate-500">Download:
          {% for link in exports %}
          <a href="{{ link.href }}" class="underline">{{ link.label }}</a>
          {% endfor %}
        </span>
      </section>

      <nav aria-label="Alphabet">
        <form action="/filter" method="post" class="flex flex-wrap gap-1">
          {% for letter in letters %}
          {% if letter.enabled %}
          <button name="letter" value="{{ letter.label }}" class="px-2 py-1 rounded {% if letter.active %}bg-amber-600 text-white{% else %}bg-white hover:bg-amber-100{% endif %}">{{ letter.label }}</button>
          {% else %}
          <button disabled class="px-2 py-1 rounded text-slate-300">{{ letter.label }}</button>
          {% endif %}
          {% endfor %}
        </form>
      </nav>

      {% if cards.len() == 0 %}
      <div class="rounded-xl bg-white p-8 text-center">
        <p class="text-lg">No terms match these filters.</p>
        <form action="/reset" method="post"><button class="underline">Show every term</button></form>
      </div>
      {% endif %}

      <section class="grid grid-cols-1 {% if quick_mode %}md:grid-cols-2{% else %}xl:grid-cols-2{% endif %} gap-6">
        {% for card in cards %}
        <article id="term-{{ card.record.id }}" class="bg-white rounded-xl border shadow-sm {% if card.highlighted %}ring-4 ring-amber-400{% else %}{% if card.expanded %}ring-2 ring-amber-200{% else %}border-amber-100{% endif %}{% endif %}">
          <div class="p-5 space-y-2">
            <div class="flex flex-wrap gap-2 text-xs">
              <span class="rounded-full px-2 py-1 bg-{{ card.category_tone }}-100 text-{{ card.category_tone }}-800">{{ card.record.category }}</span>
              <span class="rounded-full px-2 py-1 bg-{{ card.difficulty_tone }}-100 text-{{ card.difficulty_tone }}-800">{{ card.record.difficulty }}</span>
              {% if card.learned %}<span class="rounded-full px-2 py-1 bg-green-600 text-white">Learned</span>{% endif %}
            </div>
            <form action="/expand/{{ card.record.id }}" method="post">
              <h2 class="text-2xl font-bold"><button class="text-left">{{ card.record.term }}</button></h2>
            </form>
            <p class="text-slate-700">{{ card.summary }}</p>
            <div class="flex flex-wrap gap-3 text-sm">
              <form action="/learned/{{ card.record.id }}" method="post">
                <button class="underline">{% if card.learned %}Mark as not learned{% else %}Mark as learned{% endif %}</button>
              </form>
              <a href="/term/{{ card.record.id }}" class="underline">Permalink</a>
              <a href="{{ card.ask_href }}" class="underline">Ask Krusty</a>
              {% for link in card.quick_links %}
              <a href="{{ link.url }}" target="_blank" rel="noreferrer" class="underline text-amber-700">{{ link.label }}</a>
              {% endfor %}
            </div>
          </div>
          {% match card.detail %}
          {% when Some with (detail) %}
          <div class="border-t border-amber-100">
            <nav class="flex gap-1 px-4" aria-label="Detail tabs">
              {% for tab in detail.tabs %}
              <form action="/tab/{{ tab.name }}" method="post">
                <button class="px-4 py-3 text-sm font-medium border-b-2 {% if tab.active %}border-amber-500 text-amber-700{% else %}border-transparent text-slate-500{% endif %}">{{ tab.label }}</button>
              </form>
              {% endfor %}
            </nav>
            <div class="p-5 space-y-4">
              {% if detail.tab == "overview" %}
              <div class="prose max-w-none">{{ detail.definition_html|safe }}</div>
              <div class="flex flex-wrap gap-2 text-sm">
                <a href="{{ detail.youtube_url }}" target="_blank" rel="noreferrer" class="rounded-lg bg-red-50 px-3 py-2">Watch Video</a>
                {% if detail.featured_in_book %}<a href="{{ book_url }}" target="_blank" rel="noreferrer" class="rounded-lg bg-amber-100 px-3 py-2">Get the Book</a>{% endif %}
                <a href="{{ detail.blog_url }}" target="_blank" rel="noreferrer" class="rounded-lg bg-slate-100 px-3 py-2">Read Blog</a>
                <a href="{{ community_url }}" target="_blank" rel="noreferrer" class="rounded-lg bg-blue-50 px-3 py-2">Facebook Group</a>
                {% if detail.starter_related %}<a href="{{ starter_guide_url }}" target="_blank" rel="noreferrer" class="rounded-lg bg-green-50 px-3 py-2">Starter Guide</a>{% endif %}
              </div>
              {% if detail.gear.len() > 0 %}
              <div>
                <h3 class="font-semibold">Recommended Gear</h3>
                <ul class="list-disc pl-5">
                  {% for tool in detail.gear %}
                  <li><a href="{{ tool.url }}" target="_blank" rel="noreferrer" class="underline">{{ tool.name }}</a></li>
                  {% endfor %}
                </ul>
              </div>
              {% endif %}
              {% for media in detail.media %}
              <div class="rounded-lg bg-slate-100 p-6 text-center text-slate-400">{{ media }}</div>
              {% endfor %}
              {% match detail.calculator %}
              {% when Some with (calc) %}
              <form action="/#term-{{ card.record.id }}" method="get" class="rounded-lg border border-slate-200 bg-slate-50 p-4 space-y-2">
                <p class="font-semibold text-amber-700">Baker's Percentage Calculator</p>
                <label>Flour (g) <input name="flour" value="{{ detail.flour_input }}" class="border rounded px-2 py-1 w-24"></label>
                <label>Hydration (%) <input name="hydration" value="{{ detail.hydration_input }}" class="border rounded px-2 py-1 w-20"></label>
                <button class="rounded bg-slate-900 px-3 py-1 text-white">Calculate</button>
                <p>Water: <strong>{{ calc.water }}g</strong> · Salt (2%): <strong>{{ calc.salt }}g</strong> · Starter (20%): <strong>{{ calc.starter }}g</strong> · Total dough: <strong>{{ calc.total }}g</strong></p>
              </form>
              {% when None %}
              {% endmatch %}
              {% match detail.converter %}
              {% when Some with (temps) %}
              <form action="/#term-{{ card.record.id }}" method="get" class="rounded-lg border border-slate-200 bg-slate-50 p-4 space-y-2">
                <p class="font-semibold text-amber-700">Temperature Converter</p>
                <label>Celsius <input name="celsius" value="{{ temps.celsius }}" class="border rounded px-2 py-1 w-24"></label>
                <span>=</span>
                <label>Fahrenheit <input name="fahrenheit" value="{{ temps.fahrenheit }}" class="border rounded px-2 py-1 w-24"></label>
                <button name="from" value="c" class="rounded bg-slate-900 px-3 py-1 text-white">°C → °F</button>
                <button name="from" value="f" class="rounded bg-slate-900 px-3 py-1 text-white">°F → °C</button>
              </form>
              {% when None %}
              {% endmatch %}
              {% if detail.related.len() > 0 %}
              <div class="flex flex-wrap gap-2 items-center">
                <span class="text-sm text-slate-500">Related:</span>
                {% for related in detail.related %}
                <form action="/related/{{ related.id }}" method="post">
                  <button class="rounded-full bg-amber-100 px-3 py-1 text-sm">{{ related.term }}</button>
                </form>
                {% endfor %}
              </div>
              {% endif %}
              {% match detail.go_deeper %}
              {% when Some with (links) %}
              <div class="rounded-lg border border-amber-100 p-4 space-y-3">
                <h3 class="font-semibold uppercase tracking-wider text-sm text-slate-700">Go Deeper</h3>
                {% if links.youtube_videos.len() > 0 %}
                <div>
                  <p class="text-sm text-slate-500">Video Tutorials</p>
                  <ul class="list-disc pl-5">{% for link in links.youtube_videos %}<li><a href="{{ link.url }}" target="_blank" rel="noreferrer" class="underline">{{ link.title }}</a></li>{% endfor %}</ul>
                </div>
                {% endif %}
                {% if links.academy_courses.len() > 0 %}
                <div>
                  <p class="text-sm text-slate-500">Academy Courses</p>
                  <ul class="list-disc pl-5">
                    {% for link in links.academy_courses %}
                    <li><a href="{{ link.url }}" target="_blank" rel="noreferrer" class="underline">{{ link.title }}</a>{% match link.description %}{% when Some with (about) %} <span class="text-slate-500">{{ about }}</span>{% when None %}{% endmatch %}</li>
                    {% endfor %}
                  </ul>
                </div>
                {% endif %}
                {% if links.pantry_recipes.len() > 0 %}
                <div>
                  <p class="text-sm text-slate-500">Practice Recipes</p>
                  <ul class="list-disc pl-5">{% for link in links.pantry_recipes %}<li><a href="{{ link.url }}" target="_blank" rel="noreferrer" class="underline">{{ link.title }}</a></li>{% endfor %}</ul>
                </div>
                {% endif %}
              </div>
              {% when None %}
              {% endmatch %}
              {% endif %}

              {% if detail.tab == "expert" %}
              {% if card.record.henrys_tips.len() > 0 %}
              <div>
                <h3 class="font-semibold">Henry's Tips</h3>
                <ul class="list-disc pl-5">{% for tip in card.record.henrys_tips %}<li>{{ tip }}</li>{% endfor %}</ul>
              </div>
              {% endif %}
              {% if card.record.common_mistakes.len() > 0 %}
              <div>
                <h3 class="font-semibold">Common Mistakes</h3>
                <ul class="list-disc pl-5">{% for mistake in card.record.common_mistakes %}<li>{{ mistake }}</li>{% endfor %}</ul>
              </div>
              {% endif %}
              {% if card.record.troubleshooting.len() > 0 %}
              <div>
                <h3 class="font-semibold">Troubleshooting</h3>
                <dl>{% for item in card.record.troubleshooting %}<dt class="font-medium">{{ item.problem }}</dt><dd class="mb-2 text-slate-600">{{ item.solution }}</dd>{% endfor %}</dl>
              </div>
              {% endif %}
              {% endif %}

              {% if detail.tab == "deep" %}
              {% match card.record.history %}
              {% when Some with (history) %}
              <div><h3 class="font-semibold">History</h3><p>{{ history }}</p></div>
              {% when None %}
              {% endmatch %}
              {% match card.record.difficulty_explanation %}
              {% when Some with (why) %}
              <div><h3 class="font-semibold">Why {{ card.record.difficulty }}?</h3><p>{{ why }}</p></div>
              {% when None %}
              {% endmatch %}
              {% match card.record.book_chapter %}
              {% when Some with (chapter) %}
              <div><h3 class="font-semibold">In the Book</h3><p><a href="{{ book_url }}" target="_blank" rel="noreferrer" class="underline">{{ chapter }}</a></p></div>
              {% when None %}
              {% endmatch %}
              {% if card.record.sources.len() > 0 %}
              <div>
                <h3 class="font-semibold">Sources</h3>
                <ul class="list-disc pl-5">{% for source in card.record.sources %}<li>{{ source }}</li>{% endfor %}</ul>
              </div>
              {% endif %}
              {% if card.record.links.len() > 0 %}
              <div>
                <h3 class="font-semibold">Further Reading</h3>
                <ul class="list-disc pl-5">{% for link in card.record.links %}<li><a href="{{ link.url }}" target="_blank" rel="noreferrer" class="underline">{{ link.label }}</a></li>{% endfor %}</ul>
              </div>
              {% endif %}
              {% endif %}

              {% if detail.tab == "recipes" %}
              <ul class="list-disc pl-5">
                {% for recipe in card.record.related_recipes %}
                {% match recipe.url %}
                {% when Some with (url) %}
                <li><a href="{{ url }}" target="_blank" rel="noreferrer" class="underline">{{ recipe.name }}</a></li>
                {% when None %}
                <li>{{ recipe.name }}</li>
                {% endmatch %}
                {% endfor %}
              </ul>
              {% endif %}
            </div>
          </div>
          {% when None %}
          {% endmatch %}
        </article>
        {% endfor %}
      </section>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct HomeTemplate<'a> {
    site_name: &'static str,
    base_url: &'a str,
    json_ld: SafeJson,
    search: &'a str,
    categories: Vec<OptionView>,
    difficulties: Vec<OptionView>,
    paths: Vec<PathView<'a>>,
    letters: Vec<LetterView>,
    quick_mode: bool,
    filtered: bool,
    exports: Vec<ExportLink>,
    cards: Vec<CardView<'a>>,
    visible_count: usize,
    total_count: usize,
    learned_count: usize,
    book_url: &'static str,
    community_url: &'static str,
    starter_guide_url: &'static str,
}

impl<'a> HomeTemplate<'a> {
    fn build(
        controller: &'a PresentationController,
        highlight: Option<&str>,
        widgets: &WidgetParams,
        base_url: &'a str,
    ) -> Self {
        let content = controller.content();
        let filters = controller.filters();
        let visible = controller.visible();
        let buckets = filter::letter_buckets(content.records());
        let expanded_id = controller.expanded_id();

        let categories = filter::categories(content.records())
            .into_iter()
            .map(|value| OptionView {
                selected: filters.category.as_str() == value,
                value,
            })
            .collect();
        let difficulties = filter::difficulties(content.records())
            .into_iter()
            .map(|value| OptionView {
                selected: filters.difficulty.as_str() == value,
                value,
            })
            .collect();
        let paths = content
            .paths()
            .iter()
            .map(|path| {
                let active = filters.active_path_id.as_deref() == Some(path.id.as_str());
                let target = if active { ALL } else { path.id.as_str() };
                PathView {
                    path,
                    target,
                    active,
                    resolved: content.path_records(path).len(),
                }
            })
            .collect();
        let letters = filter::alphabet()
            .into_iter()
            .map(|label| LetterView {
                enabled: label == ALL || buckets.contains(&label),
                active: filters.selected_letter.as_str() == label,
                label,
            })
            .collect();
        let query = filter_query(filters);
        let exports = [ExportFormat::Json, ExportFormat::Csv, ExportFormat::Markdown]
            .into_iter()
            .map(|format| ExportLink {
                label: match format {
                    ExportFormat::Json => "JSON",
                    ExportFormat::Csv => "CSV",
                    ExportFormat::Markdown => "Markdown",
                },
                href: if query.is_empty() {
                    format!("/api/terms?format={format}")
                } else {
                    format!("/api/terms?{query}&format={format}")
                },
            })
            .collect();

        let visible_count = visible.len();
        let cards = visible
            .into_iter()
            .map(|record| {
                let expanded = expanded_id == Some(record.id.as_str());
                CardView {
                    record,
                    summary: record
                        .short_definition
                        .as_deref()
                        .filter(|text| !text.is_empty())
                        .unwrap_or(&record.definition),
                    category_tone: category_tone(&record.category).as_str(),
                    difficulty_tone: difficulty_tone(&record.difficulty).as_str(),
                    learned: controller.learned().contains(&record.id),
                    expanded,
                    highlighted: highlight == Some(record.id.as_str()),
                    quick_links: content
                        .term_links(&record.id)
                        .map(quick_links)
                        .unwrap_or_default(),
                    ask_href: ask_href(&record.term),
                    detail: (expanded && !controller.quick_mode())
                        .then(|| DetailView::build(controller, record, widgets)),
                }
            })
            .collect();

        Self {
            site_name: SITE_NAME,
            base_url,
            json_ld: MarkupDisplay::new_safe(site_json_ld(base_url, content.len()), HtmlEscaper),
            search: &filters.search_text,
            categories,
            difficulties,
            paths,
            letters,
            quick_mode: controller.quick_mode(),
            filtered: !filters.is_unfiltered(),
            exports,
            cards,
            visible_count,
            total_count: content.len(),
            learned_count: controller.learned().len(),
            book_url: BOOK_URL,
            community_url: COMMUNITY_URL,
            starter_guide_url: STARTER_GUIDE_URL,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ projection.name }} · {{ site_name }}</title>
    {% match projection.short_definition %}
    {% when Some with (summary) %}
    <meta name="description" content="{{ summary }}">
    {% when None %}
    {% endmatch %}
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    <link rel="canonical" href="{{ canonical_url }}">
    <script type="application/ld+json">
    {{ json_ld }}
    </script>
  </head>
  <body class="bg-amber-50 text-slate-900">
    <main class="min-h-screen max-w-3xl mx-auto py-10 px-4 space-y-6">
      <a href="/" class="text-sm text-amber-700 underline">← {{ site_name }}</a>
      <header class="space-y-2">
        <div class="flex gap-2 text-xs">
          <span class="rounded-full px-2 py-1 bg-{{ category_tone }}-100 text-{{ category_tone }}-800">{{ projection.category }}</span>
          <span class="rounded-full px-2 py-1 bg-{{ difficulty_tone }}-100 text-{{ difficulty_tone }}-800">{{ projection.difficulty }}</span>
          {% if projection.featured_in_book %}<span class="rounded-full px-2 py-1 bg-amber-600 text-white">In the book</span>{% endif %}
        </div>
        <h1 class="text-4xl font-extrabold tracking-tight">{{ projection.name }}</h1>
        {% match projection.pronunciation %}
        {% when Some with (pronunciation) %}
        <p class="text-slate-500 italic">{{ pronunciation }}</p>
        {% when None %}
        {% endmatch %}
      </header>
      <section class="prose max-w-none bg-white rounded-xl p-6">{{ definition_html|safe }}</section>
      {% if record.henrys_tips.len() > 0 %}
      <section class="bg-white rounded-xl p-6">
        <h2 class="text-xl font-semibold">Henry's Tips</h2>
        <ul class="list-disc pl-5">{% for tip in record.henrys_tips %}<li>{{ tip }}</li>{% endfor %}</ul>
      </section>
      {% endif %}
      {% if projection.common_mistakes.len() > 0 %}
      <section class="bg-white rounded-xl p-6">
        <h2 class="text-xl font-semibold">Common Mistakes</h2>
        <ul class="list-disc pl-5">{% for mistake in projection.common_mistakes %}<li>{{ mistake }}</li>{% endfor %}</ul>
      </section>
      {% endif %}
      {% match projection.history %}
      {% when Some with (history) %}
      <section class="bg-white rounded-xl p-6"><h2 class="text-xl font-semibold">History</h2><p>{{ history }}</p></section>
      {% when None %}
      {% endmatch %}
      {% if projection.affiliate_links.len() > 0 %}
      <section class="bg-white rounded-xl p-6">
        <h2 class="text-xl font-semibold">Recommended Gear</h2>
        <ul class="list-disc pl-5">{% for link in projection.affiliate_links %}<li><a href="{{ link.url }}" target="_blank" rel="noreferrer" class="underline">{{ link.name }}</a></li>{% endfor %}</ul>
      </section>
      {% endif %}
      {% if related.len() > 0 %}
      <section class="flex flex-wrap gap-2 items-center">
        <span class="text-sm text-slate-500">Related:</span>
        {% for term in related %}
        <a href="/term/{{ term.id }}" class="rounded-full bg-amber-100 px-3 py-1 text-sm">{{ term.term }}</a>
        {% endfor %}
      </section>
      {% endif %}
      <section class="flex gap-3 text-sm">
        <a href="{{ youtube_url }}" target="_blank" rel="noreferrer" class="underline">Watch Video</a>
        <a href="{{ blog_url }}" target="_blank" rel="noreferrer" class="underline">Read Blog</a>
        <a href="/api/term/{{ projection.slug }}" class="underline">JSON</a>
      </section>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct TermTemplate<'a> {
    site_name: &'static str,
    projection: &'a TermProjection,
    record: &'a GlossaryRecord,
    canonical_url: String,
    json_ld: SafeJson,
    definition_html: String,
    related: Vec<&'a GlossaryRecord>,
    youtube_url: String,
    blog_url: String,
    category_tone: &'static str,
    difficulty_tone: &'static str,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Ask Krusty · {{ site_name }}</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  </head>
  <body class="bg-amber-50 text-slate-900">
    <main class="min-h-screen max-w-3xl mx-auto py-10 px-4 space-y-6">
      <a href="/" class="text-sm text-amber-700 underline">← {{ site_name }}</a>
      <h1 class="text-4xl font-extrabold tracking-tight">Ask Krusty</h1>
      <section class="space-y-3" aria-label="Conversation">
        {% for line in lines %}
        <div class="flex {% if line.from_user %}justify-end{% else %}justify-start{% endif %}">
          <p class="max-w-[80%] rounded-xl px-4 py-2 whitespace-pre-wrap {% if line.from_user %}bg-amber-600 text-white{% else %}bg-white border border-amber-100{% endif %}">{{ line.text }}</p>
        </div>
        {% endfor %}
      </section>
      <form action="/chat" method="post" class="flex gap-2">
        <textarea name="message" rows="3" placeholder="Ask Krusty..." class="flex-1 border border-slate-300 rounded-lg px-3 py-2">{{ draft }}</textarea>
        <button class="rounded-lg bg-slate-900 px-4 py-2 text-white">Send</button>
      </form>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct ChatTemplate<'a> {
    site_name: &'static str,
    lines: Vec<ChatLine<'a>>,
    draft: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{{ site_name }} · Error</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
  </head>
  <body class="bg-amber-50 text-slate-900">
    <main class="min-h-screen max-w-3xl mx-auto py-10 px-4 space-y-4">
      <h1 class="text-4xl font-extrabold tracking-tight">Something went wrong</h1>
      <p class="text-lg text-slate-600">{{ message }}</p>
      <a href="/" class="inline-flex items-center rounded-md bg-slate-900 px-4 py-2 text-white font-semibold">Back to the glossary</a>
    </main>
  </body>
</html>"#,
    ext = "html"
)]
struct ErrorTemplate {
    site_name: &'static str,
    message: String,
}
