//! `park sessions start`: the wizard on a terminal.

use std::io::Write;
use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use park_flow::capture::photo_from_path;
use park_flow::format::location_summary;
use park_flow::step::ListState;
use park_flow::steps::{car, ViewMode};
use park_flow::{Step, StepContext, WizardRunner, WizardStep};

enum Flow {
    Continue,
    Quit,
}

struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` on end of input.
    async fn ask(&mut self, question: &str) -> anyhow::Result<Option<String>> {
        print!("{question} ");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }
}

pub async fn start_session(ctx: StepContext, photo: Option<PathBuf>) -> anyhow::Result<()> {
    let mut runner = WizardRunner::new(ctx);
    let mut prompt = Prompt::new();
    let mut preset_photo = photo;
    info!(wizard_id = %runner.wizard().id(), "session wizard started");

    while !runner.wizard().is_finished() {
        println!();
        println!(
            "{} · {}",
            runner.wizard().progress_label(),
            runner.step().title()
        );
        if let Some(error) = runner.wizard().error() {
            println!("! {error}");
        }

        let flow = match runner.step() {
            WizardStep::Photo => photo_step(&mut runner, &mut prompt, preset_photo.take()).await?,
            WizardStep::Car => car_step(&mut runner, &mut prompt).await?,
            WizardStep::Location => location_step(&mut runner, &mut prompt).await?,
            WizardStep::Details => details_step(&mut runner, &mut prompt).await?,
        };
        if let Flow::Quit = flow {
            info!(wizard_id = %runner.wizard().id(), "session wizard abandoned");
            println!("Cancelled.");
            return Ok(());
        }
    }
    Ok(())
}

async fn photo_step(
    runner: &mut WizardRunner,
    prompt: &mut Prompt,
    preset: Option<PathBuf>,
) -> anyhow::Result<Flow> {
    let mut step = runner.photo_step();
    step.enter(runner.ctx()).await;
    if let Some(advisory) = step.advisory() {
        println!("{advisory}");
    }
    if let Some(coords) = step.coords() {
        println!("Location: {coords}");
    }

    let mut next_path = preset;
    loop {
        if let Some(path) = next_path.take() {
            match photo_from_path(&path).await {
                Ok(photo) => step.set_photo(photo),
                Err(e) => println!("{}", e.user_message()),
            }
        }
        if let Some(photo) = step.photo() {
            println!("Photo: {} ({} bytes)", photo.file_name, photo.len());
        }

        let question = if step.can_continue() {
            "Enter to continue, a path to retake, x to clear, q to quit:"
        } else {
            "Path to the parking photo (q to quit):"
        };
        match prompt.ask(question).await?.as_deref() {
            None | Some("q") => return Ok(Flow::Quit),
            Some("x") => step.clear(),
            Some("") => match step.confirm() {
                Some(input) => {
                    runner.apply(input)?;
                    return Ok(Flow::Continue);
                }
                None => println!("Take a photo first."),
            },
            Some(path) => next_path = Some(PathBuf::from(path)),
        }
    }
}

async fn car_step(runner: &mut WizardRunner, prompt: &mut Prompt) -> anyhow::Result<Flow> {
    let mut step = runner.car_step();
    step.enter(runner.ctx()).await;

    loop {
        match step.state() {
            ListState::Loading => {}
            ListState::Failed(message) => println!("{message}. r to retry."),
            state if state.is_empty() => {
                println!("{}", car::EMPTY_MESSAGE);
                println!("{}", car::EMPTY_ACTION);
            }
            ListState::Loaded(cars) => {
                for (n, car) in cars.iter().enumerate() {
                    let mark = if step.is_selected(car) { "*" } else { " " };
                    println!("{mark} {}. {}", n + 1, car.license_plate);
                }
            }
        }

        match prompt.ask("Vehicle number, b to go back, q to quit:").await?.as_deref() {
            None | Some("q") => return Ok(Flow::Quit),
            Some("b") => {
                runner.back()?;
                return Ok(Flow::Continue);
            }
            Some("r") => step.retry(runner.ctx()).await,
            Some(choice) => {
                let picked = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| step.state().items().get(i))
                    .map(|car| car.id.clone());
                match picked.and_then(|id| step.select(&id)) {
                    Some(input) => {
                        runner.apply(input)?;
                        return Ok(Flow::Continue);
                    }
                    None => println!("No such vehicle."),
                }
            }
        }
    }
}

async fn location_step(runner: &mut WizardRunner, prompt: &mut Prompt) -> anyhow::Result<Flow> {
    let mut step = runner.location_step();
    step.enter(runner.ctx()).await;

    loop {
        println!("{}", step.mode().description());
        if let Some(notice) = step.notice() {
            println!("{notice}");
        }
        match step.state() {
            ListState::Loading => {}
            ListState::Failed(message) => println!("{message}. r to retry."),
            ListState::Loaded(locations) => {
                if locations.is_empty() {
                    println!("No parking locations found.");
                }
                for (n, location) in locations.iter().enumerate() {
                    println!("  {}. {}  {}", n + 1, location.name, location_summary(location));
                }
            }
        }

        let mut options = vec!["number", "n if not listed"];
        match step.mode() {
            ViewMode::Proximity => options.push("a for all"),
            ViewMode::All if step.can_show_nearby() => options.push("near for nearby"),
            ViewMode::All => {}
        }
        options.extend(["b to go back", "q to quit:"]);

        match prompt.ask(&options.join(", ")).await?.as_deref() {
            None | Some("q") => return Ok(Flow::Quit),
            Some("b") => {
                runner.back()?;
                return Ok(Flow::Continue);
            }
            Some("n") => {
                runner.apply(step.none_of_these())?;
                return Ok(Flow::Continue);
            }
            Some("a") => step.show_all(runner.ctx()).await,
            Some("near") => {
                if !step.show_nearby(runner.ctx()).await {
                    println!("Your position is unknown.");
                }
            }
            Some("r") => step.retry(runner.ctx()).await,
            Some(choice) => {
                let picked = choice
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| step.select_index(i));
                match picked {
                    Some(input) => {
                        runner.apply(input)?;
                        return Ok(Flow::Continue);
                    }
                    None => println!("No such location."),
                }
            }
        }
    }
}

async fn details_step(runner: &mut WizardRunner, prompt: &mut Prompt) -> anyhow::Result<Flow> {
    let mut step = runner.details_step();
    step.enter(runner.ctx()).await;

    let summary = step.summary(runner.wizard().draft());
    println!("Vehicle:  {}", summary.vehicle);
    match (&summary.location, &summary.max_stay) {
        (Some(location), Some(max_stay)) => println!("Location: {location} ({max_stay})"),
        _ => println!("Location: not listed, set a duration"),
    }
    if let Some(photo) = &summary.photo {
        println!("Photo:    {photo}");
    }

    if runner.wizard().draft().is_manual() {
        let current = step.duration_input().to_string();
        let question = if current.is_empty() {
            "Parking duration in minutes:".to_string()
        } else {
            format!("Parking duration in minutes [{current}]:")
        };
        match prompt.ask(&question).await?.as_deref() {
            None | Some("q") => return Ok(Flow::Quit),
            Some("b") => {
                runner.keep_details(&step)?;
                runner.back()?;
                return Ok(Flow::Continue);
            }
            Some("") => {}
            Some(raw) => step.set_duration_input(raw),
        }
    }

    if !step.can_submit(runner.wizard().draft(), runner.wizard().is_submitting()) {
        println!("Please enter a parking duration of at least one minute.");
        return Ok(Flow::Continue);
    }

    match prompt.ask("Start session? [Y/n/b/q]").await?.as_deref() {
        None | Some("q") => return Ok(Flow::Quit),
        Some("b") => {
            runner.back()?;
            return Ok(Flow::Continue);
        }
        Some("n") => {
            runner.keep_details(&step)?;
            return Ok(Flow::Continue);
        }
        Some(_) => {}
    }

    match runner.submit(&step).await {
        Ok(created) => {
            let id = created["id"]
                .as_str()
                .or_else(|| created["_id"].as_str())
                .unwrap_or("?");
            println!("Session started: {id}");
        }
        Err(e) => {
            // validation and backend failures are already on the wizard
            if runner.wizard().error().is_none() {
                warn!(error = %e, "submission not attempted");
                println!("{}", e.user_message());
            }
        }
    }
    Ok(Flow::Continue)
}
