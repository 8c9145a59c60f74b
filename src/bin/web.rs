//! Single binary web server: bracket API over an in-memory storage.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080).

use actix_web::{
    get, post, put,
    web::{Bytes, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use gymnastics_brackets::logic::seeding_from_csv;
use gymnastics_brackets::{
    BracketError, ErrorKind, Manager, MatchId, MatchUpdate, MemoryStorage, ServerConfig, StageId,
    StageInput, Table, TournamentId,
};
use serde::Deserialize;

/// Shared manager over the in-memory tables.
type AppState = Data<Manager<MemoryStorage>>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct ImportQuery {
    name: String,
    tournament_id: TournamentId,
    #[serde(default)]
    number: Option<u32>,
    #[serde(default)]
    matches_child_count: Option<u32>,
}

/// Body of a stage update: the new stage input plus the bye policy.
#[derive(Deserialize)]
struct UpdateStageBody {
    #[serde(flatten)]
    input: StageInput,
    #[serde(default)]
    enable_byes: bool,
}

/// Path segment: stage id (e.g. /api/stages/{id})
#[derive(Deserialize)]
struct StagePath {
    id: StageId,
}

/// Path segment: match or match game id
#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

/// Path segment: table name (e.g. /api/tables/match_game)
#[derive(Deserialize)]
struct TablePath {
    table: Table,
}

/// Validation errors are the caller's fault (400); everything else is ours (500).
fn error_response(e: BracketError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e.kind() {
        ErrorKind::Validation => HttpResponse::BadRequest().json(body),
        ErrorKind::Persistence | ErrorKind::Internal => {
            log::error!("Request failed: {e}");
            HttpResponse::InternalServerError().json(body)
        }
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "gymnastics-brackets",
    })
}

/// Create a stage from a JSON stage description.
#[post("/api/stages")]
async fn api_create_stage(state: AppState, body: Json<StageInput>) -> HttpResponse {
    match state.create_stage(body.into_inner()).await {
        Ok(stage) => HttpResponse::Ok().json(stage),
        Err(e) => error_response(e),
    }
}

/// Create a stage whose seeding is a CSV body (one name per line, empty cell = bye).
#[post("/api/stages/import")]
async fn api_import_stage(state: AppState, query: Query<ImportQuery>, body: Bytes) -> HttpResponse {
    let seeding = match seeding_from_csv(body.as_ref()) {
        Ok(seeding) => seeding,
        Err(e) => return error_response(e),
    };
    let query = query.into_inner();
    let mut input = StageInput::new(query.name, query.tournament_id);
    input.number = query.number;
    input.seeding = Some(seeding);
    input.settings.matches_child_count = query.matches_child_count;
    match state.create_stage(input).await {
        Ok(stage) => HttpResponse::Ok().json(stage),
        Err(e) => error_response(e),
    }
}

/// Rebuild an existing stage with new input; recorded results are kept.
#[put("/api/stages/{id}")]
async fn api_update_stage(
    state: AppState,
    path: Path<StagePath>,
    body: Json<UpdateStageBody>,
) -> HttpResponse {
    let body = body.into_inner();
    match state.update_stage(path.id, body.input, body.enable_byes).await {
        Ok(stage) => HttpResponse::Ok().json(stage),
        Err(e) => error_response(e),
    }
}

/// Stage with its groups, rounds, matches, match games and participants.
#[get("/api/stages/{id}")]
async fn api_get_stage(state: AppState, path: Path<StagePath>) -> HttpResponse {
    match state.stage_data(path.id).await {
        Ok(data) => HttpResponse::Ok().json(data),
        Err(e) => error_response(e),
    }
}

/// Enter scores / results for a match.
#[put("/api/matches/{id}")]
async fn api_update_match(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<MatchUpdate>,
) -> HttpResponse {
    match state.update_match(path.id, body.into_inner()).await {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(e) => error_response(e),
    }
}

#[put("/api/match-games/{id}")]
async fn api_update_match_game(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<MatchUpdate>,
) -> HttpResponse {
    match state.update_match_game(path.id, body.into_inner()).await {
        Ok(game) => HttpResponse::Ok().json(game),
        Err(e) => error_response(e),
    }
}

/// Raw rows of one table, for debugging.
#[get("/api/tables/{table}")]
async fn api_dump_table(state: AppState, path: Path<TablePath>) -> HttpResponse {
    HttpResponse::Ok().json(state.storage().dump(path.table).await)
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let state = Data::new(Manager::new(MemoryStorage::new()));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(favicon)
            .service(api_create_stage)
            .service(api_import_stage)
            .service(api_update_stage)
            .service(api_get_stage)
            .service(api_update_match)
            .service(api_update_match_game)
            .service(api_dump_table)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
