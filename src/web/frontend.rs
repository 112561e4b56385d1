//! Embedded HTML/CSS/JS frontend for the agrisensa dashboard.
//!
//! The entire page is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies; the price chart
//! is drawn as inline SVG from the `{labels, datasets}` the API returns.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>AgriSensa Dashboard</title>
<style>
:root {
  --bg: #f4f7f2;
  --surface: #ffffff;
  --border: #d7e2d3;
  --text: #1f2d1c;
  --text-muted: #6b7a67;
  --accent: #2e7d32;
  --green: #4caf50;
  --orange: #ff9800;
  --red: #e53935;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1100px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 22px; font-weight: 600; color: var(--accent); }
.status { font-size: 12px; color: var(--text-muted); }
.status .dot { display: inline-block; width: 8px; height: 8px; border-radius: 50%; margin-right: 6px; background: var(--text-muted); }
.status .dot.ok { background: var(--green); }
.status .dot.down { background: var(--red); }

nav { display: flex; gap: 8px; margin-bottom: 20px; }
nav button {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 8px 16px;
  cursor: pointer;
  font: inherit;
}
nav button.active { background: var(--accent); border-color: var(--accent); color: #fff; }

.panel { display: none; }
.panel.active { display: block; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; margin-bottom: 12px; }

.question { font-size: 18px; font-weight: 600; margin-bottom: 16px; }
.options { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 10px; }
.options button, .primary {
  background: var(--bg);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 12px;
  cursor: pointer;
  font: inherit;
  text-align: left;
}
.options button:hover { border-color: var(--accent); }
.primary { background: var(--accent); color: #fff; border-color: var(--accent); text-align: center; }
.primary:disabled { opacity: 0.6; cursor: wait; }
.diagnosis { font-size: 20px; font-weight: 700; color: var(--accent); margin: 8px 0 16px; }
.path { color: var(--text-muted); font-size: 12px; margin-bottom: 12px; }

.controls { display: flex; flex-wrap: wrap; gap: 12px; align-items: flex-end; margin-bottom: 16px; }
.controls label { display: flex; flex-direction: column; font-size: 12px; color: var(--text-muted); gap: 4px; }
.controls input, .controls select {
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 8px;
  font: inherit;
  min-width: 180px;
}

#chart { width: 100%; height: 340px; }
#chart .axis { stroke: var(--border); }
#chart text { fill: var(--text-muted); font-size: 11px; }
.legend { display: flex; gap: 16px; font-size: 12px; margin-top: 8px; }
.legend span::before { content: ''; display: inline-block; width: 14px; height: 3px; margin-right: 6px; vertical-align: middle; background: var(--swatch); }

.summary { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 12px; }
.summary .label { font-size: 12px; color: var(--text-muted); }
.summary .value { font-size: 18px; font-weight: 600; }
.badge { display: inline-block; padding: 2px 10px; border-radius: 12px; font-weight: 600; }
.badge.trend-up { background: #e8f5e9; color: var(--accent); }
.badge.trend-down { background: #ffebee; color: var(--red); }
.badge.trend-stable { background: #fff3e0; color: #e65100; }
.insight { margin-top: 12px; color: var(--text-muted); }

.empty { color: var(--text-muted); padding: 24px 0; text-align: center; }

.toast {
  position: fixed;
  bottom: 24px;
  right: 24px;
  background: var(--text);
  color: #fff;
  padding: 10px 16px;
  border-radius: var(--radius);
  opacity: 0;
  transition: opacity 0.2s;
  max-width: 420px;
}
.toast.show { opacity: 1; }
.toast.error { background: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>🌱 AgriSensa</h1>
    <div class="status" id="status"><span class="dot"></span>memeriksa backend…</div>
  </header>

  <nav id="nav">
    <button class="active" data-panel="diagnosis">Diagnosis Tanaman</button>
    <button data-panel="market">Harga Komoditas</button>
  </nav>

  <section class="panel active" id="panel-diagnosis">
    <div class="card">
      <h2>Diagnosis Penyakit Tanaman</h2>
      <div id="diag-body"><p class="empty">Memuat pohon diagnosis…</p></div>
    </div>
  </section>

  <section class="panel" id="panel-market">
    <div class="card">
      <h2>Tren Harga</h2>
      <div class="controls">
        <label>Komoditas
          <input id="commodity" list="commodities" placeholder="cabai_merah_keriting">
          <datalist id="commodities">
            <option value="cabai_merah_keriting">
            <option value="cabai_merah_besar">
            <option value="cabe_rawit_hijau">
            <option value="cabe_rawit_merah">
            <option value="cabe_hijau_besar">
            <option value="bawang_merah">
            <option value="bawang_putih">
          </datalist>
        </label>
        <label>Periode
          <select id="range">
            <option value="7">7 Hari Terakhir</option>
            <option value="30" selected>30 Hari Terakhir</option>
            <option value="90">90 Hari (3 Bulan)</option>
            <option value="180">180 Hari (6 Bulan)</option>
            <option value="365">365 Hari (1 Tahun)</option>
          </select>
        </label>
        <button class="primary" id="load-history">Tampilkan</button>
        <label>Tanggal Prediksi
          <input type="date" id="predict-date">
        </label>
        <button class="primary" id="load-predict">Prediksi</button>
      </div>
      <svg id="chart" viewBox="0 0 800 340" preserveAspectRatio="none"></svg>
      <div class="legend" id="legend"></div>
    </div>
    <div class="card" id="prediction-card" style="display:none">
      <h2>Prediksi AI</h2>
      <div class="summary" id="prediction-summary"></div>
      <p class="insight" id="prediction-insight"></p>
    </div>
  </section>
</div>
<div class="toast" id="toast"></div>

<script>
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
// Generation counters: a response is rendered only if it answers the newest
// request of its flow. The server echoes `seq` and never compares it.
let diagSeq = 0;
let trendSeq = 0;
// Labels shown in the trail, and the keys sent back so this page's walk
// does not depend on what other pages did on the server.
let diagPath = [];
let diagKeys = [];

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return res.json();
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show' + (isError ? ' error' : '');
  setTimeout(() => el.className = 'toast', 4000);
}

function esc(s) {
  return String(s).replace(/[&<>"']/g, c => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c]));
}

function axisTick(v) {
  return (v / 1000) + 'k';
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------
document.getElementById('nav').addEventListener('click', e => {
  if (e.target.tagName !== 'BUTTON') return;
  const panel = e.target.dataset.panel;
  if (!panel) return;

  document.querySelectorAll('nav button').forEach(b => b.classList.remove('active'));
  e.target.classList.add('active');

  document.querySelectorAll('.panel').forEach(p => p.classList.remove('active'));
  document.getElementById('panel-' + panel).classList.add('active');
});

// ---------------------------------------------------------------------------
// Diagnosis
// ---------------------------------------------------------------------------
async function diagRequest(path, body, onSuccess) {
  const seq = ++diagSeq;
  try {
    const res = await api('POST', path, Object.assign({ seq }, body || {}));
    if (seq !== diagSeq) return;
    if (!res.success) {
      toast(res.error, true);
      return;
    }
    if (onSuccess) onSuccess(res);
    renderStep(res);
  } catch (e) {
    if (seq === diagSeq) toast('Gagal menghubungi server: ' + e.message, true);
  }
}

function startDiagnosis() {
  diagPath = [];
  diagKeys = [];
  diagRequest('/api/diagnostic/start');
}

function restartDiagnosis() {
  diagPath = [];
  diagKeys = [];
  diagRequest('/api/diagnostic/restart');
}

function choose(key, label) {
  diagRequest('/api/diagnostic/choose', { key, path: diagKeys.slice() }, res => {
    diagPath.push(label);
    if (res.kind === 'question') diagKeys.push(key);
  });
}

function renderStep(step) {
  const el = document.getElementById('diag-body');
  const trail = diagPath.length
    ? '<div class="path">' + diagPath.map(esc).join(' › ') + '</div>'
    : '';

  if (step.kind === 'diagnosis') {
    el.innerHTML = trail +
      '<div class="label">Hasil diagnosis:</div>' +
      '<div class="diagnosis">' + esc(step.diagnosis) + '</div>' +
      '<button class="primary" id="diag-restart">Diagnosis Ulang</button>';
    document.getElementById('diag-restart').onclick = restartDiagnosis;
    return;
  }

  el.innerHTML = trail +
    '<div class="question">' + esc(step.question) + '</div>' +
    '<div class="options">' +
    step.options.map(o => '<button data-key="' + esc(o.key) + '">' + esc(o.label) + '</button>').join('') +
    '</div>';
  el.querySelectorAll('.options button').forEach(b => {
    b.onclick = () => choose(b.dataset.key, b.textContent);
  });
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------
async function trendRequest(path, body, button) {
  const seq = ++trendSeq;
  button.disabled = true;
  try {
    const res = await api('POST', path, Object.assign({ seq }, body));
    if (seq !== trendSeq || res.applied === 'stale') return;
    if (!res.success) {
      toast(res.error, true);
      return;
    }
    renderChart(res.chart);
    renderPrediction(res.prediction);
  } catch (e) {
    if (seq === trendSeq) toast('Gagal menghubungi server: ' + e.message, true);
  } finally {
    button.disabled = false;
  }
}

function commodity() {
  const el = document.getElementById('commodity');
  return el.value.trim() || el.placeholder;
}

function loadHistory() {
  const range = parseInt(document.getElementById('range').value, 10);
  trendRequest('/api/market/historical', { commodity: commodity(), range },
    document.getElementById('load-history'));
}

function loadPrediction() {
  const date = document.getElementById('predict-date').value;
  if (!date) {
    toast('Pilih tanggal prediksi terlebih dahulu', true);
    return;
  }
  trendRequest('/api/market/predict', { commodity: commodity(), date },
    document.getElementById('load-predict'));
}

function renderChart(chart) {
  const svg = document.getElementById('chart');
  const legend = document.getElementById('legend');
  if (!chart || chart.labels.length === 0) {
    svg.innerHTML = '<text x="400" y="170" text-anchor="middle">Tidak ada data</text>';
    legend.innerHTML = '';
    return;
  }

  const W = 800, H = 340, left = 56, right = 16, top = 16, bottom = 40;
  const values = chart.datasets.flatMap(d => d.data.filter(v => v !== null));
  let lo = Math.min(...values), hi = Math.max(...values);
  if (lo === hi) { lo -= 1000; hi += 1000; }
  const pad = (hi - lo) * 0.1;
  lo = Math.max(0, lo - pad);
  hi = hi + pad;

  const n = chart.labels.length;
  const x = i => left + (n === 1 ? (W - left - right) / 2 : i * (W - left - right) / (n - 1));
  const y = v => top + (hi - v) * (H - top - bottom) / (hi - lo);

  let out = '';
  for (let t = 0; t <= 4; t++) {
    const v = lo + (hi - lo) * t / 4;
    out += '<line class="axis" x1="' + left + '" x2="' + (W - right) + '" y1="' + y(v) + '" y2="' + y(v) + '"/>';
    out += '<text x="' + (left - 6) + '" y="' + (y(v) + 4) + '" text-anchor="end">' + axisTick(Math.round(v)) + '</text>';
  }
  const every = Math.max(1, Math.ceil(n / 8));
  chart.labels.forEach((label, i) => {
    if (i % every !== 0 && i !== n - 1) return;
    out += '<text x="' + x(i) + '" y="' + (H - bottom + 18) + '" text-anchor="middle">' + esc(label.slice(5)) + '</text>';
  });

  for (const ds of chart.datasets) {
    const s = ds.style;
    // Gaps split the line into separate runs.
    const runs = [];
    let run = [];
    ds.data.forEach((v, i) => {
      if (v === null) {
        if (run.length) runs.push(run);
        run = [];
      } else {
        run.push([x(i), y(v)]);
      }
    });
    if (run.length) runs.push(run);

    for (const pts of runs) {
      const line = pts.map(p => p.join(',')).join(' ');
      if (s.fill && s.background_color) {
        const area = line + ' ' + pts[pts.length - 1][0] + ',' + (H - bottom) + ' ' + pts[0][0] + ',' + (H - bottom);
        out += '<polygon points="' + area + '" fill="' + s.background_color + '" stroke="none"/>';
      }
      out += '<polyline points="' + line + '" fill="none" stroke="' + s.border_color +
        '" stroke-width="' + s.border_width + '"' +
        (s.border_dash.length ? ' stroke-dasharray="' + s.border_dash.join(',') + '"' : '') + '/>';
      for (const p of pts) {
        out += '<circle cx="' + p[0] + '" cy="' + p[1] + '" r="' + s.point_radius +
          '" fill="' + (s.point_background_color || s.border_color) +
          '" stroke="' + (s.point_border_color || s.border_color) +
          '" stroke-width="' + s.point_border_width + '"/>';
      }
    }
  }
  svg.innerHTML = out;
  legend.innerHTML = chart.datasets
    .map(d => '<span style="--swatch:' + d.style.border_color + '">' + esc(d.label) + '</span>')
    .join('');
}

function renderPrediction(p) {
  const card = document.getElementById('prediction-card');
  if (!p) {
    card.style.display = 'none';
    return;
  }
  card.style.display = '';
  document.getElementById('prediction-summary').innerHTML =
    item('Tanggal', esc(p.prediction_date)) +
    item('Harga Saat Ini', esc(p.current_price_text)) +
    item('Harga Prediksi', esc(p.predicted_price_text)) +
    item('Tren', '<span class="badge ' + p.badge_class + '">' + esc(p.badge) + '</span>');
  document.getElementById('prediction-insight').textContent = p.insight || '';
}

function item(label, value) {
  return '<div><div class="label">' + label + '</div><div class="value">' + value + '</div></div>';
}

// ---------------------------------------------------------------------------
// Boot
// ---------------------------------------------------------------------------
function dateLimits() {
  const iso = d => d.toISOString().slice(0, 10);
  const today = new Date();
  const min = new Date(today); min.setDate(today.getDate() + 1);
  const max = new Date(today); max.setFullYear(today.getFullYear() + 1);
  const el = document.getElementById('predict-date');
  el.min = iso(min);
  el.max = iso(max);
}

async function boot() {
  document.getElementById('load-history').onclick = loadHistory;
  document.getElementById('load-predict').onclick = loadPrediction;
  dateLimits();

  try {
    const health = await api('GET', '/api/health');
    const status = document.getElementById('status');
    status.innerHTML = '<span class="dot ' + (health.backend_reachable ? 'ok' : 'down') + '"></span>' +
      esc(health.backend_url) + (health.backend_reachable ? '' : ' (tidak terjangkau)');
    document.getElementById('commodity').placeholder = health.default_commodity;
    document.getElementById('range').value = String(health.default_range);
  } catch (e) {
    toast('Gagal memeriksa backend: ' + e.message, true);
  }

  startDiagnosis();
  loadHistory();
}

boot();
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_calls_every_api_route() {
        for route in [
            "/api/diagnostic/start",
            "/api/diagnostic/choose",
            "/api/diagnostic/restart",
            "/api/market/historical",
            "/api/market/predict",
            "/api/health",
        ] {
            assert!(INDEX_HTML.contains(route), "missing {route}");
        }
    }

    #[test]
    fn page_offers_every_history_range() {
        for days in [7, 30, 90, 180, 365] {
            assert!(INDEX_HTML.contains(&format!(r#"<option value="{days}""#)));
        }
    }

    #[test]
    fn page_sends_its_own_diagnosis_path() {
        assert!(INDEX_HTML.contains("{ key, path: diagKeys.slice() }"));
    }
}
