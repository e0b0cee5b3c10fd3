//! One-shot subcommands.

use std::io::Write;
use std::ops::ControlFlow;
use std::path::Path;

use anyhow::{Context as _, bail};
use chrono::Utc;
use tracing::info;

use park_flow::capture::photo_from_path;
use park_flow::step::ListState;
use park_flow::views::{cars, locations, sessions};
use park_flow::views::{CarForm, CarLine, LocationForm, SessionLines};
use park_flow::{Countdown, SessionFilter, StepContext};

fn loaded<T>(state: ListState<T>) -> anyhow::Result<Vec<T>> {
    match state {
        ListState::Loaded(items) => Ok(items),
        ListState::Failed(message) => bail!(message),
        ListState::Loading => bail!("still loading"),
    }
}

pub async fn list_cars(ctx: &StepContext) -> anyhow::Result<()> {
    let registered = loaded(cars::load_cars(ctx.api()).await)?;
    if registered.is_empty() {
        println!("{}", cars::EMPTY_LIST);
    }
    for car in &registered {
        let line = CarLine::from(car);
        println!("{}  {}  {}", car.id, line.license_plate, line.photo_url);
    }
    Ok(())
}

pub async fn add_car(ctx: &StepContext, plate: String, photo: &Path) -> anyhow::Result<()> {
    let photo = photo_from_path(photo).await?;
    let form = CarForm::new(plate, Some(photo));
    let created = form
        .submit(ctx.api())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!(
        "Registered {}",
        created["license_plate"]
            .as_str()
            .unwrap_or(&form.license_plate.to_uppercase())
    );
    Ok(())
}

pub async fn list_locations(ctx: &StepContext) -> anyhow::Result<()> {
    let saved = loaded(locations::load_locations(ctx.api()).await)?;
    if saved.is_empty() {
        println!("{}", locations::EMPTY_LIST);
    }
    for location in &saved {
        println!("{}  {}", location.id, locations::location_line(location));
    }
    Ok(())
}

pub async fn add_location(ctx: &StepContext, mut form: LocationForm) -> anyhow::Result<()> {
    form.submit(ctx.api(), ctx.geolocator())
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    println!("Saved {}", form.name.trim());
    Ok(())
}

pub async fn list_sessions(ctx: &StepContext, filter: SessionFilter) -> anyhow::Result<()> {
    let cards = sessions::load_dashboard(ctx.api(), filter)
        .await
        .context(sessions::LOAD_FAILED)?;

    if cards.is_empty() {
        match filter {
            SessionFilter::Active => println!("{}", sessions::EMPTY_LIST),
            _ => println!("No parking sessions."),
        }
        return Ok(());
    }

    let now = Utc::now();
    for card in &cards {
        let remaining = card.remaining(now);
        println!(
            "{}  {}  {}  {}  {}{}  {}",
            card.id,
            card.license_plate,
            card.location_name,
            card.status,
            remaining.label(),
            remaining,
            card.ends_at()
        );
    }
    Ok(())
}

fn print_session(lines: &SessionLines) {
    println!("Vehicle:  {}", lines.vehicle);
    println!("Location: {}", lines.location);
    println!("Status:   {}", lines.status);
    println!("Start:    {}", lines.start);
    println!("End:      {}", lines.end);
    println!("Duration: {}", lines.duration);
    if let Some(ended) = &lines.ended_manually {
        println!("{ended}");
    }
    if !lines.photo_url.is_empty() {
        println!("Photo:    {}", lines.photo_url);
    }
}

pub async fn show_session(ctx: &StepContext, id: &str) -> anyhow::Result<()> {
    let details = sessions::load_session(ctx.api(), id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    print_session(&SessionLines::from(&details));
    if details.is_active() {
        let left = Countdown::new(details.end_time).now();
        println!("{}{}", left.label(), left);
    }
    Ok(())
}

pub async fn complete_session(ctx: &StepContext, id: &str) -> anyhow::Result<()> {
    let details = sessions::complete_and_refresh(ctx.api(), id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    print_session(&SessionLines::from(&details));
    Ok(())
}

pub async fn watch_session(ctx: &StepContext, id: &str) -> anyhow::Result<()> {
    let details = sessions::load_session(ctx.api(), id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    if !details.is_active() {
        println!("Session is {}", details.status);
        return Ok(());
    }

    info!(session_id = %id, end_time = %details.end_time, "watching session");
    let countdown = Countdown::new(details.end_time);
    let ticking = countdown.run(|left| {
        print!("\r{}{}    ", left.label(), left);
        let _ = std::io::stdout().flush();
        if left.is_overdue() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    tokio::select! {
        _ = ticking => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    println!();
    Ok(())
}
