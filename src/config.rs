use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::Endpoints;
use crate::error::ConfigError;
use crate::simulation::cycle::CycleConfig;

/// Configuração completa do simulador
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub endpoints: Endpoints,
    pub cycle: CycleConfig,
    /// Intervalo entre disparos de cada residente
    pub trigger_period: Duration,
    /// Faixa para sorteio do batimento base de cada residente
    pub baseline_range: RangeInclusive<u32>,
    /// Arquivo CSV opcional de leituras
    pub log_file: Option<PathBuf>,
    /// Semente para execuções reproduzíveis
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    pub fn endpoints_default(base_url: impl Into<String>) -> Endpoints {
        Endpoints {
            base_url: base_url.into(),
            residents_path: "/api/residentes".to_string(),
            readings_path: "/api/lecturas".to_string(),
            alerts_path: "/api/alertas".to_string(),
        }
    }

    /// Verifica os limites dos parâmetros
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.cycle.critical_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Probability(p));
        }
        let (min, max) = (*self.baseline_range.start(), *self.baseline_range.end());
        if min == 0 || min > max {
            return Err(ConfigError::BaselineRange { min, max });
        }
        if let Some(hour) = self.cycle.fixed_hour {
            if hour > 23 {
                return Err(ConfigError::Hour(hour));
            }
        }
        if self.cycle.critical_repetitions == 0 {
            return Err(ConfigError::Zero("repetições críticas"));
        }
        if self.cycle.critical_tick.is_zero() {
            return Err(ConfigError::Zero("intervalo crítico"));
        }
        if self.trigger_period.is_zero() {
            return Err(ConfigError::Zero("período de disparo"));
        }
        Ok(())
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            endpoints: Self::endpoints_default("http://localhost:5000"),
            cycle: CycleConfig::default(),
            trigger_period: Duration::from_secs(11),
            baseline_range: 60..=90,
            log_file: None,
            seed: None,
        }
    }
}
