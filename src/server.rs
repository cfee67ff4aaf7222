//! Dashboard server.
//!
//! Serves the embedded dashboard page plus JSON/CSV endpoints over the
//! same pipeline the CLI runs: fetch (memoized), normalize, filter,
//! aggregate. Every parameter change from the page is a fresh request
//! that re-runs the whole pipeline; there is no incremental state beyond
//! the fetch cache.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::cache::FetchCache;
use crate::client::AfadClient;
use crate::config::Settings;
use crate::errors::AftershockError;
use crate::filters::{DateRange, EventFilter, MagnitudeRange};
use crate::metrics::MetricsReport;
use crate::models::{Event, EventRecord};
use crate::normalize::normalize;
use crate::output;

/// Magnitude slider domain on the dashboard.
const MAG_FLOOR: f64 = 0.0;
const MAG_CEIL: f64 = 10.0;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub settings: Settings,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Blocking AFAD client, shared across requests
    client: Arc<AfadClient>,
    /// Memoized fetch windows
    cache: Arc<Mutex<FetchCache>>,
    /// Resolved settings
    settings: Settings,
}

/// Range and filter parameters accepted by every `/api` route.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/events", get(events_handler))
        .route("/api/metrics", get(metrics_handler))
        .route("/api/export.csv", get(export_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the dashboard server.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the listener fails.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let client = AfadClient::new(&config.settings)?;

    let state = AppState {
        client: Arc::new(client),
        cache: Arc::new(Mutex::new(FetchCache::with_default_capacity())),
        settings: config.settings.clone(),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("aftershock dashboard starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Resolve the fetch window: explicit bounds, or the configured trailing
/// window ending today.
fn resolve_range(
    query: &DashboardQuery,
    settings: &Settings,
    today: NaiveDate,
) -> Result<DateRange, AftershockError> {
    let end = query.end.unwrap_or(today);
    let start = query
        .start
        .unwrap_or(end - Duration::days(settings.window_days));
    DateRange::new(start, end)
}

/// Build the magnitude predicate from the query, if any bound was given.
fn magnitude_from_query(query: &DashboardQuery) -> Result<Option<MagnitudeRange>, AftershockError> {
    match (query.min_magnitude, query.max_magnitude) {
        (None, None) => Ok(None),
        (min, max) => Ok(Some(MagnitudeRange::new(
            min.unwrap_or(MAG_FLOOR),
            max.unwrap_or(MAG_CEIL),
        )?)),
    }
}

/// Run the full pipeline for one request.
///
/// Blocking: the caller wraps this in `spawn_blocking`.
fn run_pipeline(state: &AppState, query: &DashboardQuery) -> Result<Vec<Event>, AftershockError> {
    let range = resolve_range(query, &state.settings, Utc::now().date_naive())?;

    let raw = {
        let mut cache = state
            .cache
            .lock()
            .map_err(|_| AftershockError::InvalidRange("cache lock poisoned".to_string()))?;
        state.client.fetch_window_cached(&mut cache, &range)?
    };

    let events = normalize(
        &raw,
        &state.settings.country,
        state.settings.local_offset_hours,
    )?;

    let filter = EventFilter {
        date: Some(range),
        magnitude: magnitude_from_query(query)?,
    };
    Ok(filter.apply(&events))
}

/// Run the pipeline on a blocking worker and fold errors into a response.
async fn pipeline_response(
    state: AppState,
    query: DashboardQuery,
) -> Result<Vec<Event>, (StatusCode, String)> {
    let result = tokio::task::spawn_blocking(move || run_pipeline(&state, &query))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("pipeline task failed: {e}"),
            )
        })?;

    result.map_err(|e| {
        tracing::warn!("pipeline failed: {}", e);
        let status = match e {
            AftershockError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, e.to_string())
    })
}

/// Main page handler - serves the embedded dashboard.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Filtered events as JSON.
async fn events_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<EventRecord>>, (StatusCode, String)> {
    let events = pipeline_response(state, query).await?;
    Ok(Json(events.iter().map(EventRecord::from).collect()))
}

/// Metrics report as JSON.
async fn metrics_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<MetricsReport>, (StatusCode, String)> {
    let events = pipeline_response(state, query).await?;
    Ok(Json(MetricsReport::compute(&events, Utc::now())))
}

/// CSV download of the filtered table.
async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let events = pipeline_response(state, query).await?;
    let bytes = output::csv_bytes(&events)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"earthquake_data.csv\"",
            ),
        ],
        bytes,
    ))
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en" data-theme="dark">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Aftershock — Earthquake Dashboard</title>
<style>
  :root {
    --bg: #0f1115; --panel: #181b21; --border: #262b33;
    --text: #e6e8eb; --dim: #8b919a; --accent: #06b6d4; --danger: #ef4444;
  }
  * { box-sizing: border-box; margin: 0; }
  body {
    background: var(--bg); color: var(--text);
    font: 14px/1.5 system-ui, sans-serif; padding: 24px;
    max-width: 960px; margin: 0 auto;
  }
  h1 { font-size: 20px; margin-bottom: 4px; }
  .sub { color: var(--dim); margin-bottom: 20px; }
  .controls {
    display: flex; flex-wrap: wrap; gap: 12px; align-items: end;
    background: var(--panel); border: 1px solid var(--border);
    border-radius: 8px; padding: 16px; margin-bottom: 20px;
  }
  .controls label { display: block; color: var(--dim); font-size: 12px; }
  .controls input {
    background: var(--bg); color: var(--text);
    border: 1px solid var(--border); border-radius: 4px; padding: 6px 8px;
  }
  .controls button, .controls a.button {
    background: var(--accent); color: #03212a; border: 0; border-radius: 4px;
    padding: 8px 16px; font-weight: 600; cursor: pointer; text-decoration: none;
  }
  .tiles { display: flex; gap: 12px; margin-bottom: 20px; }
  .tile {
    flex: 1; background: var(--panel); border: 1px solid var(--border);
    border-radius: 8px; padding: 16px;
  }
  .tile .value { font-size: 26px; font-weight: 700; }
  .tile .label { color: var(--dim); font-size: 12px; }
  section { margin-bottom: 24px; }
  h2 { font-size: 15px; margin-bottom: 8px; color: var(--dim); }
  table { width: 100%; border-collapse: collapse; }
  th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid var(--border); }
  th { color: var(--dim); font-weight: 500; font-size: 12px; }
  .bar-row { display: flex; align-items: center; gap: 8px; margin: 2px 0; }
  .bar-label { width: 48px; color: var(--dim); font-size: 12px; }
  .bar { background: var(--accent); height: 12px; border-radius: 2px; }
  .error { color: var(--danger); padding: 12px 0; }
  .mag-strong { color: var(--danger); font-weight: 700; }
</style>
</head>
<body>
  <h1>Aftershock</h1>
  <div class="sub">Earthquake dashboard — data source: AFAD</div>

  <div class="controls">
    <div><label for="start">Start date</label><input type="date" id="start"></div>
    <div><label for="end">End date</label><input type="date" id="end"></div>
    <div><label for="minmag">Min magnitude</label>
      <input type="number" id="minmag" min="0" max="10" step="0.1" value="0"></div>
    <div><label for="maxmag">Max magnitude</label>
      <input type="number" id="maxmag" min="0" max="10" step="0.1" value="8"></div>
    <button id="apply">Apply</button>
    <a class="button" id="download" href="/api/export.csv">Download CSV</a>
  </div>

  <div class="tiles">
    <div class="tile"><div class="value" id="total">–</div>
      <div class="label">Total earthquakes</div></div>
    <div class="tile"><div class="value" id="gap24">–</div>
      <div class="label">Avg gap, last 24h (hh:mm)</div></div>
  </div>

  <div id="error" class="error" hidden></div>

  <section>
    <h2>Daily max magnitude</h2>
    <div id="dailymax"></div>
  </section>

  <section>
    <h2>Magnitude distribution</h2>
    <div id="histogram"></div>
  </section>

  <section>
    <h2>Strongest earthquakes</h2>
    <table>
      <thead><tr><th>Magnitude</th><th>Time (GMT)</th><th>Local</th>
        <th>Depth</th><th>Location</th></tr></thead>
      <tbody id="strongest"></tbody>
    </table>
  </section>

<script>
function params() {
  var p = new URLSearchParams();
  var start = document.getElementById('start').value;
  var end = document.getElementById('end').value;
  if (start) p.set('start', start);
  if (end) p.set('end', end);
  p.set('min_magnitude', document.getElementById('minmag').value);
  p.set('max_magnitude', document.getElementById('maxmag').value);
  return p.toString();
}

function gapText(minutes) {
  if (minutes === null || minutes === undefined) return 'no data';
  var whole = Math.round(minutes);
  var h = String(Math.floor(whole / 60)).padStart(2, '0');
  var m = String(whole % 60).padStart(2, '0');
  return h + ':' + m;
}

function renderBars(el, rows, labelOf, valueOf) {
  el.innerHTML = '';
  if (!rows.length) { el.textContent = 'no data'; return; }
  var max = Math.max.apply(null, rows.map(valueOf));
  rows.forEach(function (row) {
    var line = document.createElement('div');
    line.className = 'bar-row';
    var label = document.createElement('span');
    label.className = 'bar-label';
    label.textContent = labelOf(row);
    var bar = document.createElement('span');
    bar.className = 'bar';
    bar.style.width = (max > 0 ? (valueOf(row) / max) * 100 : 0) + '%';
    var value = document.createElement('span');
    value.textContent = valueOf(row);
    line.append(label, bar, value);
    el.appendChild(line);
  });
}

async function refresh() {
  var errorBox = document.getElementById('error');
  errorBox.hidden = true;
  document.getElementById('download').href = '/api/export.csv?' + params();
  try {
    var resp = await fetch('/api/metrics?' + params());
    if (!resp.ok) throw new Error(await resp.text());
    var report = await resp.json();

    document.getElementById('total').textContent = report.total_count;
    document.getElementById('gap24').textContent = gapText(report.gap_24h_minutes);

    renderBars(document.getElementById('dailymax'), report.daily_max_magnitude,
      function (r) { return r.date; }, function (r) { return r.value; });
    renderBars(document.getElementById('histogram'), report.magnitude_histogram,
      function (r) { return 'M' + r.magnitude.toFixed(1); },
      function (r) { return r.count; });

    var tbody = document.getElementById('strongest');
    tbody.innerHTML = '';
    report.strongest.forEach(function (e) {
      var tr = document.createElement('tr');
      var mag = e.magnitude === null ? '?' : e.magnitude.toFixed(1);
      var cls = e.magnitude !== null && e.magnitude >= 6.0 ? ' class="mag-strong"' : '';
      tr.innerHTML = '<td' + cls + '>M' + mag + '</td><td>' + e.timestamp +
        '</td><td>' + e.local_time + '</td><td>' +
        (e.depth_km === null ? '?' : e.depth_km + ' km') + '</td><td></td>';
      tr.lastChild.textContent = e.location;
      tbody.appendChild(tr);
    });
  } catch (err) {
    errorBox.textContent = 'Failed to load data: ' + err.message;
    errorBox.hidden = false;
  }
}

document.getElementById('apply').addEventListener('click', refresh);
refresh();
</script>
</body>
</html>"##;
