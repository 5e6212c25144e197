use crate::calendar::{CalendarDay, MonthCalendar};
use crate::progress::MonthlyProgress;
use std::fmt::Write;

pub struct IndexView<'a> {
    pub today: String,
    pub progress: &'a MonthlyProgress,
    pub calendar: &'a MonthCalendar,
    /// Goal to show, possibly the configured placeholder.
    pub display_goal: Option<f64>,
    pub goal_is_fallback: bool,
}

pub fn render_index(view: &IndexView<'_>) -> String {
    let progress = view.progress;
    let goal_label = match (view.display_goal, view.goal_is_fallback) {
        (Some(goal), false) => format!("{} km", format_km(goal)),
        (Some(goal), true) => format!("{} km (default)", format_km(goal)),
        (None, _) => "Not set".to_string(),
    };

    INDEX_HTML
        .replace("{{TITLE}}", &view.calendar.title)
        .replace("{{TODAY}}", &view.today)
        .replace("{{YEAR}}", &progress.year.to_string())
        .replace("{{MONTH}}", &progress.month.to_string())
        .replace("{{PREV_LINK}}", &month_link(view.calendar.previous.map(|m| (m.year, m.month))))
        .replace("{{NEXT_LINK}}", &month_link(view.calendar.next.map(|m| (m.year, m.month))))
        .replace("{{TOTAL}}", &format_km(progress.month_total_distance))
        .replace("{{GOAL}}", &goal_label)
        .replace("{{PERCENT}}", &format_optional(progress.achievement_percent, "%"))
        .replace("{{PACE}}", &format_signed(progress.pace_difference()))
        .replace("{{CALENDAR}}", &render_calendar(view.calendar))
}

pub fn format_km(value: f64) -> String {
    format!("{value:.1}")
}

fn format_optional(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(value) => format!("{value:.1}{suffix}"),
        None => "--".to_string(),
    }
}

fn format_signed(value: Option<f64>) -> String {
    match value {
        Some(value) if value >= 0.0 => format!("+{value:.1} km"),
        Some(value) => format!("{value:.1} km"),
        None => "--".to_string(),
    }
}

fn month_link(target: Option<(i32, u32)>) -> String {
    match target {
        Some((year, month)) => format!("/?year={year}&month={month}"),
        None => "/".to_string(),
    }
}

/// Calendar table, Monday first. Days with runs show their distance.
pub fn render_calendar(calendar: &MonthCalendar) -> String {
    let mut html = String::from("<table class=\"calendar\"><thead><tr>");
    for name in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"] {
        let _ = write!(html, "<th>{name}</th>");
    }
    html.push_str("</tr></thead><tbody>");
    for week in &calendar.weeks {
        html.push_str("<tr>");
        for slot in week {
            match slot {
                Some(day) => render_day(&mut html, day),
                None => html.push_str("<td class=\"pad\"></td>"),
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn render_day(html: &mut String, day: &CalendarDay) {
    let mut classes = vec!["day"];
    if day.is_today {
        classes.push("today");
    }
    if day.is_future {
        classes.push("future");
    }
    if day.distance.is_some() {
        classes.push("ran");
    }
    let _ = write!(
        html,
        "<td class=\"{}\" data-date=\"{}\"><span class=\"num\">{}</span>",
        classes.join(" "),
        day.date,
        day.day
    );
    if let Some(distance) = day.distance {
        let _ = write!(html, "<span class=\"km\">{} km</span>", format_km(distance));
    }
    html.push_str("</td>");
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Running Log</title>
  <style>
    :root {
      --bg: #eef3ef;
      --ink: #1f2a27;
      --muted: #6d7a75;
      --accent: #ff6b4a;
      --pace: #2f4858;
      --card: rgba(255, 255, 255, 0.9);
      --line: rgba(47, 72, 88, 0.1);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(160deg, var(--bg), #f9f6ee 70%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 28px 16px 44px;
    }

    .app {
      width: min(900px, 100%);
      background: var(--card);
      border-radius: 26px;
      box-shadow: 0 22px 56px rgba(47, 72, 88, 0.16);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.8rem, 4vw, 2.5rem);
    }

    header a {
      color: var(--pace);
      text-decoration: none;
      font-weight: 600;
      padding: 8px 14px;
      border-radius: 999px;
      background: var(--line);
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(170px, 1fr));
      gap: 14px;
    }

    .stat {
      background: white;
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 16px;
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.5rem;
      font-weight: 600;
    }

    form.entry {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
    }

    form.entry input {
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 12px;
      font: inherit;
    }

    form.entry button {
      border: none;
      border-radius: 999px;
      padding: 12px 20px;
      font: inherit;
      font-weight: 600;
      background: var(--accent);
      color: white;
      cursor: pointer;
    }

    .calendar {
      width: 100%;
      border-collapse: separate;
      border-spacing: 6px;
      table-layout: fixed;
    }

    .calendar th {
      font-size: 0.8rem;
      color: var(--muted);
      font-weight: 500;
    }

    .calendar td {
      height: 64px;
      vertical-align: top;
      border-radius: 12px;
      padding: 6px;
    }

    .calendar td.day {
      background: white;
      border: 1px solid var(--line);
      cursor: pointer;
    }

    .calendar td.future {
      opacity: 0.45;
    }

    .calendar td.today {
      border-color: var(--accent);
    }

    .calendar td.ran {
      background: #fff1ec;
    }

    .calendar .num {
      display: block;
      font-size: 0.85rem;
      color: var(--muted);
    }

    .calendar .km {
      display: block;
      margin-top: 6px;
      font-weight: 600;
      color: var(--accent);
    }

    .chart-card {
      background: white;
      border: 1px solid var(--line);
      border-radius: 18px;
      padding: 14px;
    }

    #chart {
      width: 100%;
      height: 260px;
      display: block;
    }

    .bar {
      fill: rgba(255, 107, 74, 0.25);
    }

    .cumulative {
      fill: none;
      stroke: var(--accent);
      stroke-width: 3;
    }

    .pace {
      fill: none;
      stroke: var(--pace);
      stroke-width: 2;
      stroke-dasharray: 6 6;
    }

    .chart-grid {
      stroke: var(--line);
    }

    .chart-label {
      fill: var(--muted);
      font-size: 11px;
    }

    .status {
      min-height: 1.2em;
      color: var(--muted);
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }
  </style>
</head>
<body>
  <main class="app" data-year="{{YEAR}}" data-month="{{MONTH}}">
    <header>
      <a href="{{PREV_LINK}}" aria-label="Previous month">&larr;</a>
      <h1>{{TITLE}}</h1>
      <a href="{{NEXT_LINK}}" aria-label="Next month">&rarr;</a>
    </header>

    <section class="panel">
      <div class="stat">
        <span class="label">This month</span>
        <span id="total" class="value">{{TOTAL}} km</span>
      </div>
      <div class="stat">
        <span class="label">Goal</span>
        <span id="goal" class="value">{{GOAL}}</span>
      </div>
      <div class="stat">
        <span class="label">Achieved</span>
        <span id="percent" class="value">{{PERCENT}}</span>
      </div>
      <div class="stat">
        <span class="label">Vs. pace</span>
        <span id="pace" class="value">{{PACE}}</span>
      </div>
    </section>

    <form class="entry" id="entry-form">
      <input type="date" id="entry-date" value="{{TODAY}}" required />
      <input type="number" id="entry-distance" min="0" step="0.01" placeholder="Distance (km)" required />
      <button type="submit">Log run</button>
    </form>

    <section id="calendar">{{CALENDAR}}</section>

    <section class="chart-card">
      <svg id="chart" viewBox="0 0 600 260" aria-label="Cumulative distance and goal pace" role="img"></svg>
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const app = document.querySelector('.app');
    const year = app.dataset.year;
    const month = app.dataset.month;
    const chartEl = document.getElementById('chart');
    const statusEl = document.getElementById('status');
    const form = document.getElementById('entry-form');
    const dateInput = document.getElementById('entry-date');
    const distanceInput = document.getElementById('entry-distance');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const renderChart = (progress) => {
      const width = 600;
      const height = 260;
      const padX = 40;
      const padY = 30;
      const top = 16;
      const days = progress.days_in_month;
      if (!days) {
        chartEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data</text>';
        return;
      }

      const known = progress.cumulative_distances.filter((v) => v !== null);
      const pace = progress.cumulative_goal_pace || [];
      const max = Math.max(1, ...known, ...pace, ...progress.daily_distances);
      const step = (width - padX * 2) / days;
      const x = (i) => padX + step * (i + 0.5);
      const y = (v) => height - padY - (v / max) * (height - top - padY);

      let out = '';
      for (let i = 0; i <= 4; i += 1) {
        const v = (max * i) / 4;
        out += `<line class="chart-grid" x1="${padX}" y1="${y(v)}" x2="${width - padX}" y2="${y(v)}" />`;
        out += `<text class="chart-label" x="${padX - 8}" y="${y(v) + 4}" text-anchor="end">${Math.round(v)}</text>`;
      }

      progress.daily_distances.forEach((v, i) => {
        if (v > 0) {
          out += `<rect class="bar" x="${x(i) - step * 0.35}" y="${y(v)}" width="${step * 0.7}" height="${y(0) - y(v)}" />`;
        }
      });

      if (pace.length) {
        const d = pace.map((v, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(1)} ${y(v).toFixed(1)}`).join(' ');
        out += `<path class="pace" d="${d}" />`;
      }

      const line = progress.cumulative_distances
        .map((v, i) => (v === null ? null : `${x(i).toFixed(1)} ${y(v).toFixed(1)}`))
        .filter((p) => p !== null);
      if (line.length) {
        out += `<path class="cumulative" d="M ${line.join(' L ')}" />`;
      }

      for (let i = 0; i < days; i += 5) {
        out += `<text class="chart-label" x="${x(i)}" y="${height - padY + 16}" text-anchor="middle">${i + 1}</text>`;
      }
      chartEl.innerHTML = out;
    };

    const loadProgress = async () => {
      const res = await fetch(`/api/progress?year=${year}&month=${month}`);
      if (!res.ok) {
        throw new Error('Unable to load progress');
      }
      renderChart(await res.json());
    };

    document.getElementById('calendar').addEventListener('click', (event) => {
      const cell = event.target.closest('td.day');
      if (cell) {
        dateInput.value = cell.dataset.date;
        distanceInput.focus();
      }
    });

    form.addEventListener('submit', async (event) => {
      event.preventDefault();
      setStatus('Saving...', 'info');
      const res = await fetch('/api/records', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ date: dateInput.value, distance: Number(distanceInput.value) })
      });
      if (!res.ok) {
        setStatus((await res.text()) || 'Request failed', 'error');
        return;
      }
      distanceInput.value = '';
      setStatus('Saved', 'ok');
    });

    const events = new EventSource('/api/events');
    ['record_saved', 'record_deleted', 'monthly_goal_set', 'resync'].forEach((name) => {
      events.addEventListener(name, () => window.location.reload());
    });

    loadProgress().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::build_month_calendar;
    use crate::models::{MonthlyGoal, RunRecord};
    use crate::progress::aggregate_month;
    use chrono::NaiveDate;

    fn fixture(goal: Option<f64>) -> (MonthlyProgress, MonthCalendar) {
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let records = vec![RunRecord {
            id: "r1".into(),
            date: "2025-06-01".into(),
            distance: 5.0,
        }];
        let goals = vec![MonthlyGoal {
            year: 2025,
            month: 6,
            distance_goal: goal,
        }];
        (
            aggregate_month(&records, &goals, 2025, 6, today),
            build_month_calendar(&records, 2025, 6, today),
        )
    }

    #[test]
    fn index_shows_month_figures() {
        let (progress, calendar) = fixture(Some(90.0));
        let html = render_index(&IndexView {
            today: "2025-06-02".into(),
            progress: &progress,
            calendar: &calendar,
            display_goal: progress.goal_for_month,
            goal_is_fallback: false,
        });
        assert!(html.contains("June 2025"));
        assert!(html.contains("5.0 km"));
        assert!(html.contains("90.0 km"));
        assert!(html.contains("/?year=2025&month=5"));
        assert!(html.contains("/?year=2025&month=7"));
        assert!(html.contains("data-date=\"2025-06-01\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn unset_goal_is_not_reported_as_zero() {
        let (progress, calendar) = fixture(None);
        let html = render_index(&IndexView {
            today: "2025-06-02".into(),
            progress: &progress,
            calendar: &calendar,
            display_goal: None,
            goal_is_fallback: false,
        });
        assert!(html.contains("Not set"));
        assert!(html.contains("<span id=\"percent\" class=\"value\">--</span>"));
    }

    #[test]
    fn fallback_goal_is_labelled() {
        let (progress, calendar) = fixture(None);
        let html = render_index(&IndexView {
            today: "2025-06-02".into(),
            progress: &progress,
            calendar: &calendar,
            display_goal: Some(50.0),
            goal_is_fallback: true,
        });
        assert!(html.contains("50.0 km (default)"));
    }

    #[test]
    fn future_month_has_no_pace_figure() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let goals = vec![MonthlyGoal {
            year: 2025,
            month: 7,
            distance_goal: Some(62.0),
        }];
        let progress = aggregate_month(&[], &goals, 2025, 7, today);
        let calendar = build_month_calendar(&[], 2025, 7, today);
        let html = render_index(&IndexView {
            today: "2025-06-02".into(),
            progress: &progress,
            calendar: &calendar,
            display_goal: progress.goal_for_month,
            goal_is_fallback: false,
        });
        assert!(html.contains("<span id=\"pace\" class=\"value\">--</span>"));
        assert!(!html.contains("+0.0 km"));
    }

    #[test]
    fn calendar_marks_run_days() {
        let (_, calendar) = fixture(None);
        let html = render_calendar(&calendar);
        assert!(html.contains("class=\"day ran\" data-date=\"2025-06-01\""));
        assert!(html.contains("class=\"day today\" data-date=\"2025-06-02\""));
        assert!(html.contains("class=\"day future\" data-date=\"2025-06-03\""));
    }
}
