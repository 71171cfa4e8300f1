//! Console page handler
//!
//! Single embedded HTML page: batch upload with live progress, ad-hoc
//! search, flagged-result review with clear dialog, and the report summary.
//! Candidates render as per-row accordions showing the top five matches
//! with expandable field detail; absent fields show as "not applicable".

use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;

use crate::AppState;

/// GET /
///
/// Screening console landing page
pub async fn console_page() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp = env!("BUILD_TIMESTAMP");
    let git_hash = env!("GIT_HASH");

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>ScreenDesk Screening Console</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
        }}
        header {{
            background-color: #2a2a2a;
            border-bottom: 1px solid #3a3a3a;
            padding: 16px 24px;
            display: flex;
            justify-content: space-between;
            align-items: baseline;
        }}
        header h1 {{ font-size: 1.3em; }}
        header .stats {{ color: #9a9a9a; font-size: 0.85em; }}
        .container {{ padding: 24px; max-width: 960px; margin: 0 auto; }}
        section {{
            background-color: #242424;
            border: 1px solid #3a3a3a;
            border-radius: 6px;
            padding: 16px;
            margin-bottom: 20px;
        }}
        section h2 {{ font-size: 1.05em; margin-bottom: 10px; color: #cfcfcf; }}
        input[type=text], input[type=file] {{
            background: #1a1a1a; color: #e0e0e0;
            border: 1px solid #444; border-radius: 4px; padding: 6px 8px;
        }}
        button {{
            background: #3d6abf; color: #fff; border: none; border-radius: 4px;
            padding: 6px 14px; cursor: pointer;
        }}
        button:hover {{ background: #4f7cd1; }}
        button.danger {{ background: #a33; }}
        .banner {{
            background: #5a2525; border: 1px solid #8a3a3a; border-radius: 4px;
            padding: 8px 12px; margin-bottom: 12px; display: none;
        }}
        .banner .dismiss {{ float: right; cursor: pointer; }}
        progress {{ width: 100%; }}
        details {{ margin: 6px 0; border: 1px solid #3a3a3a; border-radius: 4px; padding: 6px 10px; }}
        details summary {{ cursor: pointer; }}
        .match {{ margin: 4px 0 4px 16px; }}
        .fields td {{ padding: 1px 10px 1px 0; color: #bdbdbd; font-size: 0.9em; }}
        .score {{ color: #7ab87a; }}
        .err {{ color: #d98080; }}
        .flag-sim {{ color: #d9a440; }}
        footer {{ color: #777; font-size: 0.8em; padding: 12px 24px; }}
    </style>
</head>
<body>
    <header>
        <h1>ScreenDesk</h1>
        <div class="stats" id="summary">loading…</div>
    </header>
    <div class="container">
        <div class="banner" id="banner"><span class="dismiss" onclick="hideBanner()">✕</span><span id="banner-text"></span></div>

        <section>
            <h2>Batch screening</h2>
            <input type="file" id="batch-file" accept=".csv,.txt">
            <button onclick="startScreening()">Screen file</button>
            <button class="danger" onclick="cancelScreening()">Cancel</button>
            <div id="batch-progress" style="display:none">
                <progress id="batch-bar" max="100" value="0"></progress>
                <span id="batch-label"></span>
            </div>
            <div id="batch-results"></div>
        </section>

        <section>
            <h2>Name search</h2>
            <input type="text" id="search-term" placeholder="e.g. John Smith">
            <button onclick="runSearch()">Search</button>
            <div id="search-results"></div>
        </section>

        <section>
            <h2>Flagged results</h2>
            <div id="flags"></div>
        </section>
    </div>
    <footer>screendesk-console v{version} · built {build_timestamp} · {git_hash}</footer>

    <script>
        const NA = 'not applicable';
        let sessionId = null;

        function showBanner(text) {{
            document.getElementById('banner-text').textContent = text;
            document.getElementById('banner').style.display = 'block';
        }}
        function hideBanner() {{
            document.getElementById('banner').style.display = 'none';
        }}
        async function call(url, options) {{
            const response = await fetch(url, options);
            const body = await response.json();
            if (!response.ok) {{
                throw new Error(body.error ? body.error.message : response.statusText);
            }}
            return body;
        }}
        function field(value) {{ return (value === undefined || value === null || value === '') ? NA : value; }}

        function renderMatch(m) {{
            const d = m.data || m.hit || m;
            const aliases = (d.aka || []).concat(d.aliasNames || []).join(', ');
            return `<details class="match"><summary>${{field(d.full_name || [d.firstName, d.secondName, d.thirdName].filter(Boolean).join(' '))}}
                <span class="score">score ${{m.score !== undefined ? m.score.toFixed(2) : field(d.similarityPercentage)}}</span></summary>
                <table class="fields">
                <tr><td>aliases</td><td>${{field(aliases)}}</td></tr>
                <tr><td>source</td><td>${{field(d.source)}}</td></tr>
                <tr><td>country</td><td>${{field(d.country)}}</td></tr>
                <tr><td>similarity</td><td>${{field(d.similarityPercentage)}}</td></tr>
                </table></details>`;
        }}

        async function startScreening() {{
            const picker = document.getElementById('batch-file');
            if (!picker.files.length) {{ showBanner('Choose a CSV file first'); return; }}
            const form = new FormData();
            form.append('file', picker.files[0]);
            try {{
                const started = await call('/screening/start', {{ method: 'POST', body: form }});
                sessionId = started.session_id;
                document.getElementById('batch-progress').style.display = 'block';
                document.getElementById('batch-results').innerHTML = '';
            }} catch (e) {{ showBanner(e.message); }}
        }}

        async function cancelScreening() {{
            if (!sessionId) return;
            try {{ await call('/screening/cancel/' + sessionId, {{ method: 'POST' }}); }}
            catch (e) {{ showBanner(e.message); }}
        }}

        async function loadResults() {{
            const data = await call('/screening/results/' + sessionId);
            const out = data.results.map(r => {{
                const label = r.error
                    ? `${{r.name}} <span class="err">${{r.error}}</span>`
                    : `${{r.name}} — ${{r.matches.length}} match(es)`;
                return `<details><summary>${{label}}</summary>${{r.matches.map(renderMatch).join('')}}</details>`;
            }}).join('');
            document.getElementById('batch-results').innerHTML = out;
        }}

        async function runSearch() {{
            const term = document.getElementById('search-term').value;
            if (!term.trim()) {{ showBanner('Search term must not be empty'); return; }}
            try {{
                const data = await call('/search', {{
                    method: 'POST',
                    headers: {{ 'Content-Type': 'application/json' }},
                    body: JSON.stringify({{ search_term: term, search_type: 'individual' }}),
                }});
                document.getElementById('search-results').innerHTML =
                    data.results.length
                        ? data.results.map(renderMatch).join('')
                        : 'No matches.';
                await loadFlags();
            }} catch (e) {{ showBanner(e.message); }}
        }}

        async function loadFlags() {{
            const data = await call('/flags');
            document.getElementById('flags').innerHTML = data.flagged.map(f => {{
                const d = f.hit;
                return `<details><summary>${{field(d.fullName || d.full_name)}}
                    <span class="flag-sim">${{field(d.similarityPercentage)}}%</span>
                    <button onclick="clearFlag('${{f.key}}'); event.preventDefault()">Clear</button></summary>
                    ${{renderMatch(f)}}</details>`;
            }}).join('') || 'Nothing flagged.';
        }}

        async function clearFlag(key) {{
            const reason = prompt('Reason for clearing this result:');
            if (reason === null) return;
            if (!reason.trim()) {{ showBanner('A reason is required to clear a flagged result'); return; }}
            try {{
                await call('/flags/' + key + '/clear', {{
                    method: 'POST',
                    headers: {{ 'Content-Type': 'application/json' }},
                    body: JSON.stringify({{ reason }}),
                }});
                await loadFlags();
            }} catch (e) {{ showBanner(e.message); }}
        }}

        async function loadSummary() {{
            try {{
                const s = await call('/reports/summary');
                document.getElementById('summary').textContent =
                    `${{s.total_searches}} searches · ${{s.flagged_count}} flagged · ` +
                    `${{s.cleared_count}} cleared · match rate ${{s.match_rate.toFixed(1)}}%`;
            }} catch (e) {{ /* header stats are best-effort */ }}
        }}

        const events = new EventSource('/events');
        events.addEventListener('RowScreened', (e) => {{
            const ev = JSON.parse(e.data);
            if (ev.session_id !== sessionId) return;
            const done = ev.row_index + 1;
            document.getElementById('batch-bar').value = (done / ev.total_rows) * 100;
            document.getElementById('batch-label').textContent = `${{done}} / ${{ev.total_rows}}`;
        }});
        events.addEventListener('ScreeningCompleted', async (e) => {{
            const ev = JSON.parse(e.data);
            if (ev.session_id === sessionId) await loadResults();
        }});
        events.addEventListener('ScreeningCancelled', async (e) => {{
            const ev = JSON.parse(e.data);
            if (ev.session_id === sessionId) {{ showBanner('Screening cancelled'); await loadResults(); }}
        }});
        events.addEventListener('ScreeningFailed', (e) => {{
            const ev = JSON.parse(e.data);
            if (ev.session_id === sessionId) showBanner('Screening failed: ' + ev.error);
        }});
        events.addEventListener('ResultFlagged', loadFlags);

        loadSummary();
        loadFlags();
    </script>
</body>
</html>
"#
    );

    Html(html)
}

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/", get(console_page))
}
