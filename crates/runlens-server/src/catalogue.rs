//! Built-in tab forest served by the API.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use runlens_tabs::{
    Activity, AxisValue, Cell, Figure, ImageTab, PlotTab, Table, TableTab, TabNode, Trace,
};

pub const ACTIVITY_URL: &str = "https://www.strava.com/activities";
const RECENT_LIMIT: usize = 10;

pub fn default_forest() -> Vec<TabNode> {
    vec![
        TabNode::group(
            "Charts",
            vec![
                TabNode::tab(PlotTab::new(
                    "Cumulative Distance",
                    false,
                    "Running total of distance covered, per sport.",
                    cumulative_distance,
                )),
                TabNode::tab(PlotTab::new(
                    "Cumulative Time",
                    false,
                    "Running total of moving time, per sport.",
                    cumulative_time,
                )),
                TabNode::tab(PlotTab::new(
                    "Monthly Distance",
                    false,
                    "Distance covered each month, per sport.",
                    monthly_distance,
                )),
            ],
        ),
        TabNode::group(
            "Tables",
            vec![
                TabNode::tab(TableTab::new(
                    "Personal Bests",
                    true,
                    "Longest activity for each sport.",
                    personal_bests,
                )),
                TabNode::tab(TableTab::new(
                    "Recent Activities",
                    false,
                    "Your latest activities.",
                    recent_activities,
                )),
            ],
        ),
        TabNode::group(
            "Images",
            vec![TabNode::tab(ImageTab::new(
                "Weekly Calendar",
                false,
                "Daily distance laid out by week, one image per year.",
                weekly_calendar,
            ))],
        ),
    ]
}

fn activity_link(activity: &Activity) -> Cell {
    Cell::link(format!("{ACTIVITY_URL}/{}", activity.id), activity.name.clone())
}

fn km(metres: f64) -> f64 {
    (metres / 10.0).round() / 100.0
}

fn format_duration(secs: u64) -> String {
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Activities grouped by sport type, each group in start order.
fn by_sport(activities: &[Activity]) -> BTreeMap<&str, Vec<&Activity>> {
    let mut groups: BTreeMap<&str, Vec<&Activity>> = BTreeMap::new();
    for activity in activities {
        groups
            .entry(activity.sport_type.as_str())
            .or_default()
            .push(activity);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|a| a.start_date);
    }
    groups
}

fn cumulative_figure(
    activities: &[Activity],
    title: &str,
    y_title: &str,
    value: impl Fn(&Activity) -> f64,
) -> Figure {
    let mut figure = Figure::new()
        .with_title(title)
        .with_axis_titles("Date", y_title);
    for (sport, group) in by_sport(activities) {
        let mut total = 0.0;
        let mut x: Vec<AxisValue> = Vec::with_capacity(group.len());
        let mut y: Vec<AxisValue> = Vec::with_capacity(group.len());
        for activity in group {
            total += value(activity);
            x.push(activity.start_date.into());
            y.push(AxisValue::Number((total * 100.0).round() / 100.0));
        }
        figure = figure.with_trace(Trace::line(sport, x, y));
    }
    figure
}

pub fn cumulative_distance(activities: &[Activity]) -> anyhow::Result<Figure> {
    Ok(cumulative_figure(
        activities,
        "Cumulative Distance",
        "Distance (km)",
        |a| a.distance / 1000.0,
    ))
}

pub fn cumulative_time(activities: &[Activity]) -> anyhow::Result<Figure> {
    Ok(cumulative_figure(
        activities,
        "Cumulative Time",
        "Moving time (hours)",
        |a| a.moving_time as f64 / 3600.0,
    ))
}

pub fn monthly_distance(activities: &[Activity]) -> anyhow::Result<Figure> {
    let mut figure = Figure::new()
        .with_title("Monthly Distance")
        .with_axis_titles("Month", "Distance (km)");
    for (sport, group) in by_sport(activities) {
        let mut months: BTreeMap<String, f64> = BTreeMap::new();
        for activity in group {
            *months
                .entry(activity.start_date.format("%Y-%m").to_string())
                .or_default() += activity.distance;
        }
        let (x, y) = months
            .into_iter()
            .map(|(month, metres)| (AxisValue::Text(month), AxisValue::Number(km(metres))))
            .unzip();
        figure = figure.with_trace(Trace::bar(sport, x, y));
    }
    Ok(figure)
}

pub fn personal_bests(activities: &[Activity]) -> anyhow::Result<Table> {
    let mut sports = Vec::new();
    let mut links = Vec::new();
    let mut distances = Vec::new();
    let mut dates = Vec::new();

    for (sport, group) in by_sport(activities) {
        let best = group
            .iter()
            .copied()
            .max_by(|a, b| a.distance.total_cmp(&b.distance));
        let Some(best) = best else { continue };
        sports.push(Cell::text(sport));
        links.push(activity_link(best));
        distances.push(Cell::Number(km(best.distance)));
        dates.push(Cell::text(best.start_date.format("%Y-%m-%d").to_string()));
    }

    Ok(Table::new()
        .with_column("Sport", sports)
        .with_column("Activity", links)
        .with_column("Distance (km)", distances)
        .with_column("Date", dates))
}

pub fn recent_activities(activities: &[Activity]) -> anyhow::Result<Table> {
    let mut recent: Vec<&Activity> = activities.iter().collect();
    recent.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    recent.truncate(RECENT_LIMIT);

    Ok(Table::new()
        .with_column(
            "Date",
            recent
                .iter()
                .map(|a| Cell::text(a.start_date.format("%Y-%m-%d").to_string()))
                .collect(),
        )
        .with_column("Activity", recent.iter().map(|a| activity_link(a)).collect())
        .with_column("Sport", recent.iter().map(|a| Cell::text(a.sport_type.clone())).collect())
        .with_column(
            "Distance (km)",
            recent.iter().map(|a| Cell::Number(km(a.distance))).collect(),
        )
        .with_column(
            "Moving Time",
            recent
                .iter()
                .map(|a| Cell::text(format_duration(a.moving_time)))
                .collect(),
        ))
}

// ── Weekly calendar ─────────────────────────────────────────────────────────

const CELL: u32 = 12;
const GAP: u32 = 2;
const MARGIN: u32 = 20;
const LEVELS: [&str; 5] = ["#ebedf0", "#c6e48b", "#7bc96f", "#239a3b", "#196127"];

fn daily_distance(activities: &[Activity]) -> BTreeMap<NaiveDate, f64> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for activity in activities {
        *days.entry(activity.start_date.date_naive()).or_default() += activity.distance;
    }
    days
}

fn level(metres: f64, max: f64) -> usize {
    if metres <= 0.0 || max <= 0.0 {
        return 0;
    }
    let scaled = (metres / max * 4.0).ceil() as usize;
    scaled.clamp(1, 4)
}

/// Render one year as a week-by-weekday grid, Monday on the top row.
pub fn calendar_svg(year: i32, days: &BTreeMap<NaiveDate, f64>) -> anyhow::Result<String> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| anyhow::anyhow!("year {year} out of range"))?;
    let offset = first.weekday().num_days_from_monday();
    let max = days
        .iter()
        .filter(|(d, _)| d.year() == year)
        .map(|(_, m)| *m)
        .fold(0.0, f64::max);

    let width = MARGIN * 2 + 54 * (CELL + GAP);
    let height = MARGIN * 2 + 7 * (CELL + GAP);
    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    )?;
    writeln!(
        svg,
        r#"<text x="{MARGIN}" y="{}" font-family="sans-serif" font-size="12">{year}</text>"#,
        MARGIN - 6
    )?;

    for date in first.iter_days().take_while(|d| d.year() == year) {
        let week = (date.ordinal0() + offset) / 7;
        let weekday = date.weekday().num_days_from_monday();
        let metres = days.get(&date).copied().unwrap_or(0.0);
        writeln!(
            svg,
            r#"<rect x="{}" y="{}" width="{CELL}" height="{CELL}" rx="2" fill="{}"><title>{date}: {:.1} km</title></rect>"#,
            MARGIN + week * (CELL + GAP),
            MARGIN + weekday * (CELL + GAP),
            LEVELS[level(metres, max)],
            metres / 1000.0,
        )?;
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}

pub fn weekly_calendar(activities: &[Activity], dir: &Path) -> anyhow::Result<()> {
    let days = daily_distance(activities);
    let mut years: Vec<i32> = days.keys().map(|d| d.year()).collect();
    years.dedup();

    for year in years {
        let svg = calendar_svg(year, &days)?;
        fs::write(dir.join(format!("weekly_calendar_{year}.svg")), svg)?;
    }
    Ok(())
}
