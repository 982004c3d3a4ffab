use crate::model::ReportData;

/// Render a self-contained HTML report (data embedded as JSON, charts drawn
/// as SVG in the browser).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_html_report(data: &ReportData) -> anyhow::Result<String> {
    // Embedded as a JS object literal; keep "</script>" out of the payload.
    let json = serde_json::to_string(data)?.replace("</", "<\\/");

    const TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Load Report</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  .main { padding: 12px 16px; display: flex; flex-wrap: wrap; gap: 24px; }

  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }

  .chart { border: 1px solid #eee; border-radius: 6px; padding: 8px; }
  .chart h3 { margin: 0 0 4px 0; font-size: 14px; font-weight: 600; color: #333; }
  .muted { color: #777; font-size: 12px; }
  svg text { font-size: 11px; fill: #333; }
  .grid { stroke: #eee; }
  .axis { stroke: #999; }
</style>
</head>
<body>
<header>
  <div class="summary" id="summary"></div>
</header>

<div class="main" id="charts"></div>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

const W = 640, H = 400;
const PAD = { left: 64, right: 16, top: 16, bottom: 44 };

function fmt(x) {
  if (Math.abs(x) >= 1000) return Math.round(x).toString();
  return (Math.round(x * 1000) / 1000).toString();
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function renderSummary() {
  const t = DATA.totals;
  const el = document.getElementById("summary");
  el.innerHTML = `
    <span class="pill">sources: <b>${t.sources}</b></span>
    <span class="pill">seconds: <b>${t.seconds}</b></span>
    <span class="pill">window: <b>${t.window}</b></span>
    <span class="pill">total requests: <b>${t.total_requests}</b></span>
    <span class="pill">peak requests/s: <b>${t.peak_requests}</b></span>
    <span class="pill">peak load: <b>${fmt(t.peak_load)}</b></span>
    <span class="pill">capacity: <b>${fmt(t.capacity)}</b></span>
  `;
}

function extent(values) {
  let lo = Infinity, hi = -Infinity;
  for (const v of values) {
    if (v < lo) lo = v;
    if (v > hi) hi = v;
  }
  if (!isFinite(lo)) return [0, 1];
  if (lo === hi) return [lo - 1, hi + 1];
  return [lo, hi];
}

function ticks(lo, hi, n) {
  const out = [];
  for (let i = 0; i <= n; i++) out.push(lo + (hi - lo) * i / n);
  return out;
}

function renderChart(chart) {
  const xs = chart.traces.flatMap(t => t.x);
  const ys = chart.traces.flatMap(t => t.y);
  const [x0, x1] = extent(xs);
  let [y0, y1] = extent(ys);
  y0 = Math.min(0, y0);

  const sx = x => PAD.left + (x - x0) / (x1 - x0) * (W - PAD.left - PAD.right);
  const sy = y => H - PAD.bottom - (y - y0) / (y1 - y0) * (H - PAD.top - PAD.bottom);

  let svg = `<svg width="${W}" height="${H}" xmlns="http://www.w3.org/2000/svg">`;

  for (const v of ticks(y0, y1, 5)) {
    svg += `<line class="grid" x1="${PAD.left}" x2="${W - PAD.right}" y1="${sy(v)}" y2="${sy(v)}"/>`;
    svg += `<text x="${PAD.left - 6}" y="${sy(v) + 4}" text-anchor="end">${fmt(v)}</text>`;
  }
  for (const v of ticks(x0, x1, 5)) {
    svg += `<text x="${sx(v)}" y="${H - PAD.bottom + 16}" text-anchor="middle">${fmt(v)}</text>`;
  }
  svg += `<line class="axis" x1="${PAD.left}" x2="${W - PAD.right}" y1="${H - PAD.bottom}" y2="${H - PAD.bottom}"/>`;
  svg += `<line class="axis" x1="${PAD.left}" x2="${PAD.left}" y1="${PAD.top}" y2="${H - PAD.bottom}"/>`;
  svg += `<text x="${(W + PAD.left) / 2}" y="${H - 8}" text-anchor="middle">${escapeHtml(chart.x_label)}</text>`;
  svg += `<text transform="translate(14 ${(H - PAD.bottom) / 2}) rotate(-90)" text-anchor="middle">${escapeHtml(chart.y_label)}</text>`;

  for (const t of chart.traces) {
    const n = Math.min(t.x.length, t.y.length);
    const pts = [];
    for (let i = 0; i < n; i++) pts.push(`${sx(t.x[i])},${sy(t.y[i])}`);
    svg += `<polyline fill="none" stroke="${t.color}" stroke-width="1.5" points="${pts.join(" ")}"/>`;
  }

  if (chart.legend) {
    const right = chart.legend === "upper_right";
    chart.traces.forEach((t, i) => {
      const x = right ? W - PAD.right - 170 : PAD.left + 10;
      const y = PAD.top + 12 + i * 16;
      svg += `<line x1="${x}" x2="${x + 20}" y1="${y - 4}" y2="${y - 4}" stroke="${t.color}" stroke-width="2"/>`;
      svg += `<text x="${x + 26}" y="${y}">${escapeHtml(t.label)}</text>`;
    });
  }

  svg += `</svg>`;

  const div = document.createElement("div");
  div.className = "chart";
  div.id = "chart-" + chart.id;
  const title = chart.title || chart.y_label;
  div.innerHTML = `<h3>${escapeHtml(title)}</h3>` + svg;
  return div;
}

function renderCharts() {
  const root = document.getElementById("charts");
  root.innerHTML = "";
  if (!DATA.charts.length) {
    root.innerHTML = `<div class="muted">No series to plot.</div>`;
    return;
  }
  for (const c of DATA.charts) root.appendChild(renderChart(c));
}

renderSummary();
renderCharts();
</script>
</body>
</html>
"#;

    Ok(TEMPLATE.replace("__DATA__", &json))
}

/// Chart data alone, for tooling that draws its own plots.
pub fn render_json_report(data: &ReportData) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChartView, TotalsView, TraceView};

    fn data() -> ReportData {
        ReportData {
            charts: vec![ChartView {
                id: "requests".to_string(),
                title: String::new(),
                x_label: "Time (s)".to_string(),
                y_label: "Requests per second".to_string(),
                legend: None,
                traces: vec![TraceView {
                    label: "</script>".to_string(),
                    color: "#d62728".to_string(),
                    x: vec![0.0, 1.0],
                    y: vec![10.0, 15.0],
                }],
            }],
            totals: TotalsView {
                sources: 2,
                seconds: 2,
                window: 2,
                total_requests: 25,
                peak_requests: 15,
                peak_load: 0.5,
                capacity: 30.0,
            },
        }
    }

    #[test]
    fn embeds_chart_data() {
        let html = render_html_report(&data()).unwrap();
        assert!(!html.contains("__DATA__"));
        assert!(html.contains(r#""id":"requests""#));
        assert!(html.contains(r#""y":[10.0,15.0]"#));
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn json_report_round_trips_through_serde_json() {
        let json = render_json_report(&data()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["totals"]["total_requests"], 25);
        assert_eq!(v["charts"][0]["legend"], serde_json::Value::Null);
    }
}
