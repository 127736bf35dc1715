//! Configuração do micro-ondas carregada a partir de `microwave.toml`.
//!
//! A struct [`MicrowaveConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `MICROWAVE_TICK_MS` tem precedência sobre o arquivo.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::microwave::{CookSettings, DEFAULT_HEAT_RATE, HIGH_POWER_HEAT_RATE};

/// Nome do arquivo procurado no diretório atual.
pub const DEFAULT_CONFIG_FILE: &str = "microwave.toml";

/// Variável de ambiente que sobrescreve `tick_ms`.
pub const TICK_MS_ENV: &str = "MICROWAVE_TICK_MS";

/// Configuração de nível superior carregada de `microwave.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MicrowaveConfig {
    /// Duração de um tick da contagem regressiva, em milissegundos.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Aquecimento por tick na potência normal (Kelvin).
    #[serde(default = "default_heat_rate")]
    pub heat_rate: f64,

    /// Aquecimento por tick na potência alta (Kelvin).
    #[serde(default = "default_high_power_heat_rate")]
    pub high_power_heat_rate: f64,

    /// Capacidade do canal de eventos da contagem regressiva.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Filtro de log usado quando `RUST_LOG` não está definido.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Valor padrão para o tick: 1000ms.
fn default_tick_ms() -> u64 {
    1000
}

fn default_heat_rate() -> f64 {
    DEFAULT_HEAT_RATE
}

fn default_high_power_heat_rate() -> f64 {
    HIGH_POWER_HEAT_RATE
}

fn default_event_capacity() -> usize {
    64
}

// "warn" mantém o menu interativo legível.
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for MicrowaveConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            heat_rate: default_heat_rate(),
            high_power_heat_rate: default_high_power_heat_rate(),
            event_capacity: default_event_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl MicrowaveConfig {
    /// Carrega a configuração do caminho informado ou de `microwave.toml`
    /// no diretório atual. Um caminho explícito precisa existir; o arquivo
    /// padrão é opcional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração.
        if let Ok(raw) = std::env::var(TICK_MS_ENV)
            && !raw.is_empty()
        {
            config.override_tick_ms(&raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<MicrowaveConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Sobrescreve `tick_ms` a partir de texto (variável de ambiente).
    pub fn override_tick_ms(&mut self, raw: &str) -> Result<()> {
        self.tick_ms = raw
            .trim()
            .parse()
            .with_context(|| format!("{TICK_MS_ENV} must be a number of milliseconds, got `{raw}`"))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            bail!("tick_ms must be greater than zero");
        }
        for (name, rate) in [
            ("heat_rate", self.heat_rate),
            ("high_power_heat_rate", self.high_power_heat_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                bail!("{name} must be a non-negative number, got {rate}");
            }
        }
        if self.event_capacity == 0 {
            bail!("event_capacity must be greater than zero");
        }
        Ok(())
    }

    /// Converte a configuração nos parâmetros do controlador.
    pub fn cook_settings(&self) -> CookSettings {
        CookSettings {
            tick: Duration::from_millis(self.tick_ms),
            heat_rate: self.heat_rate,
            high_power_heat_rate: self.high_power_heat_rate,
            event_capacity: self.event_capacity,
        }
    }
}
