//! Interface de terminal do micro-ondas: spinner de contagem e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner da contagem regressiva e `console`
//! para estilização com cores. O [`Console`] imprime o menu e as respostas
//! dos comandos; o [`CountdownDisplay`] acompanha uma sessão de cozimento.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::MicrowaveError;
use crate::events::CookEvent;
use crate::repl::Reply;
use crate::state_machine::{CookOutcome, CookRecord, Effect};

const MENU: &str = "\
Select your action:
[0] show              Show state
[1] open              Open door
[2] close             Close door
[3] start             Click start button
[4] stop              Click stop button
[5] set-time <secs>   Set time
[6] add-30s           Add 30 seconds
[7] put <food>        Put food (1 bread, 2 meat, 3 milk)
[8] take-out          Take out food
[9] high-power-start  High power heat
    help | quit";

/// Saída colorida das respostas do micro-ondas.
#[derive(Debug, Clone)]
pub struct Console {
    // Imprime o registro da sessão em JSON ao final do cozimento.
    verbose: bool,
    green: Style,
    red: Style,
    yellow: Style,
}

impl Console {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub fn menu(&self) {
        println!("{MENU}");
        println!();
    }

    /// Ecoa um comando roteirizado como se tivesse sido digitado.
    pub fn echo(&self, line: &str) {
        println!("{} {line}", self.yellow.apply_to(">"));
    }

    /// Imprime a resposta de um comando bem-sucedido.
    pub fn reply(&self, reply: &Reply) {
        match reply {
            Reply::Status(status) => println!("{status}"),
            Reply::Transition(t) => match t.effect {
                Effect::Moved => println!("{}", self.green.apply_to(t.message)),
                Effect::Unchanged => println!("{}", self.yellow.apply_to(t.message)),
                Effect::Forbidden => println!("{}", self.red.apply_to(t.message)),
            },
            Reply::Time(time) => println!("Current cook time: {time}"),
            Reply::Placed(kind) => {
                println!("{} Successfully put {kind}!", self.green.apply_to("✓"));
            }
            Reply::TakenOut(food) => {
                println!("Food: {}", food.kind());
                println!("Temperature: {} Celsius", food.celsius());
            }
            Reply::Help => self.menu(),
            Reply::Quit => {}
        }
        println!();
    }

    /// Imprime uma recusa (operação ou entrada inválida).
    pub fn refusal(&self, err: &MicrowaveError) {
        println!("{} {err}", self.red.apply_to("✗"));
        println!();
    }

    /// Cria um display de contagem regressiva vinculado a este console.
    pub fn countdown(&self) -> CountdownDisplay {
        CountdownDisplay {
            console: self.clone(),
            pb: None,
            session_id: None,
        }
    }

    /// Acompanha todas as sessões em segundo plano até o canal fechar.
    pub fn spawn_countdown(&self, mut events: broadcast::Receiver<CookEvent>) -> JoinHandle<()> {
        let mut display = self.countdown();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => display.update(&event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!(missed, "countdown display lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn print_record(&self, record: &CookRecord) {
        let style = match record.outcome {
            CookOutcome::Completed => &self.green,
            CookOutcome::Stopped => &self.yellow,
        };
        println!("{}", style.apply_to("─── Cook Record ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(record).unwrap_or_default()
        );
    }
}

/// Spinner com o tempo restante de uma sessão de cozimento.
pub struct CountdownDisplay {
    console: Console,
    // Presente apenas enquanto uma sessão está em andamento.
    pb: Option<ProgressBar>,
    session_id: Option<Uuid>,
}

impl CountdownDisplay {
    /// Atualiza o spinner a partir de um evento da contagem.
    pub fn update(&mut self, event: &CookEvent) {
        match event {
            CookEvent::Started {
                session_id,
                remaining,
                heat_rate,
            } => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} {msg}")
                        .expect("invalid template"),
                );
                pb.set_message(format!("Countdown {remaining}"));
                pb.enable_steady_tick(std::time::Duration::from_millis(100));
                tracing::debug!(%session_id, heat_rate, "countdown display attached");
                self.pb = Some(pb);
                self.session_id = Some(*session_id);
            }
            CookEvent::Tick {
                session_id,
                remaining,
                temperature,
            } => {
                if self.session_id != Some(*session_id) {
                    return;
                }
                if let Some(pb) = &self.pb {
                    match temperature {
                        Some(kelvin) => pb.set_message(format!("Countdown {remaining}  ({kelvin:.1} K)")),
                        None => pb.set_message(format!("Countdown {remaining}")),
                    }
                }
            }
            CookEvent::Finished(record) => {
                if let Some(pb) = self.pb.take() {
                    pb.finish_and_clear();
                }
                self.session_id = None;
                // A parada já foi impressa como resposta do comando `stop`.
                if record.outcome == CookOutcome::Completed {
                    println!("{}", self.console.green.apply_to(record.outcome));
                    println!();
                }
                if self.console.verbose {
                    self.console.print_record(record);
                    println!();
                }
            }
        }
    }
}
