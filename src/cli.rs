//! Interface de linha de comando do micro-ondas baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (repl, demo)
//! e flags globais (--config, --tick-ms, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Simulador de micro-ondas com máquina de estados porta/cozimento.
#[derive(Debug, Parser)]
#[command(name = "microwave", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Caminho para o arquivo de configuração (padrão: ./microwave.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Duração de um tick em milissegundos (sobrescreve a configuração).
    #[arg(long, global = true)]
    pub tick_ms: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Menu interativo (padrão quando nenhum subcomando é informado).
    Repl,

    /// Executa uma sessão roteirizada: carne, 3 segundos, retirada.
    Demo,
}

impl Cli {
    /// Subcomando efetivo, com `repl` como padrão.
    pub fn subcommand(&self) -> Command {
        self.command.unwrap_or(Command::Repl)
    }
}
