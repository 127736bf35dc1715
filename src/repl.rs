//! Text front-end: parses user commands and dispatches them to the
//! [`Microwave`] controller.

use std::str::FromStr;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cook_time::CookTime;
use crate::error::MicrowaveError;
use crate::events::CookEvent;
use crate::food::{Food, FoodKind};
use crate::microwave::{Microwave, Status};
use crate::state_machine::{CookRecord, Transition};
use crate::ui::Console;

/// One user command. Each maps to a single controller operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Open,
    Close,
    Start,
    Stop,
    /// Raw seconds as typed; validated by the controller.
    SetTime(String),
    AddThirtySeconds,
    Put(FoodKind),
    TakeOut,
    HighPowerStart,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = MicrowaveError;

    /// Accepts the command name or its menu number, followed by the argument
    /// when one is needed: `set-time 90`, `5 90`, `put meat`, `7 2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(head) = words.next() else {
            return Err(MicrowaveError::input("empty command"));
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(MicrowaveError::input(format!("too many arguments in `{s}`")));
        }

        let command = match head.to_ascii_lowercase().as_str() {
            "0" | "show" | "status" => Command::Show,
            "1" | "open" => Command::Open,
            "2" | "close" => Command::Close,
            "3" | "start" => Command::Start,
            "4" | "stop" => Command::Stop,
            "5" | "set-time" | "set" => {
                let secs = arg.ok_or_else(|| MicrowaveError::input("set-time needs a number of seconds"))?;
                return Ok(Command::SetTime(secs.to_string()));
            }
            "6" | "add-30s" | "add" => Command::AddThirtySeconds,
            "7" | "put" => {
                let kind = arg.ok_or_else(|| MicrowaveError::input("put needs a food: bread, meat or milk"))?;
                return Ok(Command::Put(kind.parse()?));
            }
            "8" | "take-out" | "take" => Command::TakeOut,
            "9" | "high-power-start" | "high" => Command::HighPowerStart,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => {
                return Err(MicrowaveError::input(format!(
                    "unknown command `{other}`, type `help` for the menu"
                )));
            }
        };

        match arg {
            Some(extra) => Err(MicrowaveError::input(format!(
                "`{head}` takes no argument, got `{extra}`"
            ))),
            None => Ok(command),
        }
    }
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Status(Status),
    Transition(Transition),
    Time(CookTime),
    Placed(FoodKind),
    TakenOut(Food),
    Help,
    Quit,
}

/// Run one command against the microwave.
pub async fn execute(microwave: &Microwave, command: Command) -> Result<Reply, MicrowaveError> {
    let reply = match command {
        Command::Show => Reply::Status(microwave.status().await),
        Command::Open => Reply::Transition(microwave.open_door().await),
        Command::Close => Reply::Transition(microwave.close_door().await),
        Command::Start => Reply::Transition(microwave.start().await?),
        Command::Stop => Reply::Transition(microwave.stop().await?),
        Command::SetTime(raw) => Reply::Time(microwave.set_preset_time(&raw).await?),
        Command::AddThirtySeconds => Reply::Time(microwave.add_thirty_seconds().await),
        Command::Put(kind) => {
            microwave.put_food(Food::new(kind)).await?;
            Reply::Placed(kind)
        }
        Command::TakeOut => Reply::TakenOut(microwave.take_out_food().await?),
        Command::HighPowerStart => Reply::Transition(microwave.high_power_start().await?),
        Command::Help => Reply::Help,
        Command::Quit => Reply::Quit,
    };
    Ok(reply)
}

/// Interactive menu on stdin until `quit` or end of input.
pub async fn run(microwave: &Microwave, console: &Console) -> Result<()> {
    let display = console.spawn_countdown(microwave.subscribe());
    console.menu();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let outcome = match line.parse::<Command>() {
            Ok(command) => execute(microwave, command).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(Reply::Quit) => break,
            Ok(reply) => console.reply(&reply),
            Err(err) => console.refusal(&err),
        }
    }

    // Leave the oven idle before exiting.
    if let Ok(transition) = microwave.stop().await
        && transition.ends_cooking()
    {
        console.reply(&Reply::Transition(transition));
    }
    display.abort();
    Ok(())
}

/// Scripted session: meat in, three seconds, meat out.
pub async fn demo(microwave: &Microwave, console: &Console) -> Result<Option<CookRecord>> {
    let mut events = microwave.subscribe();
    let mut display = console.countdown();

    let script = ["show", "open", "put meat", "close", "set-time 3", "start"];
    for line in script {
        console.echo(line);
        match execute(microwave, line.parse()?).await {
            Ok(reply) => console.reply(&reply),
            Err(err) => console.refusal(&err),
        }
    }

    let mut record = None;
    while let Ok(event) = events.recv().await {
        display.update(&event);
        if let CookEvent::Finished(finished) = event {
            record = Some(finished);
            break;
        }
    }

    for line in ["open", "take-out", "show"] {
        console.echo(line);
        match execute(microwave, line.parse()?).await {
            Ok(reply) => console.reply(&reply),
            Err(err) => console.refusal(&err),
        }
    }
    Ok(record)
}
