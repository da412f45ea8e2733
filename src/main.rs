use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleetcal::calendar::month_view;
use fleetcal::collection::BookingCollection;
use fleetcal::config::Config;
use fleetcal::model::*;
use fleetcal::notify::NotifyHub;
use fleetcal::store::InMemoryStore;

fn parse_month(s: &str) -> Option<(i32, u32)> {
    let (y, m) = s.split_once('-')?;
    let year = y.parse().ok()?;
    let month = m.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)?;
    Some((year, month))
}

fn glyph(role: DayRole) -> char {
    match role {
        DayRole::Free => '.',
        DayRole::BookedStart => '[',
        DayRole::BookedEnd => ']',
        DayRole::BookedMiddle | DayRole::BookedSingle => '#',
        _ => '+',
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    fleetcal::observability::init(config.metrics_port)?;

    let mut args = std::env::args().skip(1);
    let (Some(vehicle), Some(month_arg)) = (args.next(), args.next()) else {
        eprintln!("usage: fleetcal <vehicle-id> <YYYY-MM>");
        std::process::exit(2);
    };
    let (year, month) = parse_month(&month_arg).ok_or("month must look like 2025-09")?;

    let raw = std::fs::read_to_string(&config.bookings_path)?;
    let records: Vec<BookingRecord> = serde_json::from_str(&raw)?;
    let hub = Arc::new(NotifyHub::new());
    let store = Arc::new(InMemoryStore::new(hub.clone()));
    let loaded = store.seed(records)?;
    info!("loaded {loaded} records from {}", config.bookings_path.display());

    let mut collection = BookingCollection::new(store).with_notify(hub);
    collection.load(&vehicle).await?;
    let index = collection.index(&vehicle);

    let days = month_view(year, month, &PendingSelection::default(), None, &index)
        .ok_or("invalid month")?;
    let today = config.today();

    println!("{vehicle}  {year}-{month:02}");
    println!(" Mo  Tu  We  Th  Fr  Sa  Su");
    let lead = days.first().map_or(0, |d| d.date.weekday().num_days_from_monday());
    let mut line = "    ".repeat(lead as usize);
    for day in &days {
        let mark = if day.date == today { '*' } else { glyph(day.role) };
        line.push_str(&format!("{:>3}{mark}", day.date.day()));
        if day.date.weekday().num_days_from_monday() == 6 {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }

    let booked = days.iter().filter(|d| d.role.is_booked()).count();
    println!();
    println!("booked: {booked} of {} days", days.len());

    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        let month_range = DayRange::new(first.date, last.date);
        if index.is_empty() {
            println!("  no bookings on {vehicle}");
        }
        for record in index.overlapping(&month_range) {
            match record.total_price() {
                Some(total) => println!("  {}  total {total}", record.label()),
                None => println!("  {}", record.label()),
            }
        }

        let start = first.date.max(today);
        if start <= last.date {
            let window = DayRange::new(start, last.date);
            println!("free:");
            for free in index.free_ranges(&window) {
                println!("  {free}");
            }
        }
    }
    Ok(())
}
