use std::ops::RangeInclusive;

use rand::Rng;

use super::heart_data::Reading;

/// Médias acumuladas após uma leitura
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub original: f64,
    pub modified: f64,
    pub samples: u64,
}

/// Estado de simulação de um residente
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Batimento médio de repouso atribuído ao residente
    pub baseline_average: u32,
    pub sample_count: u64,
    pub accumulated_original_sum: f64,
    pub accumulated_modified_sum: f64,
    /// Impede ciclos sobrepostos para o mesmo residente
    active: bool,
}

impl SimulationState {
    pub fn new(baseline_average: u32) -> Self {
        Self {
            baseline_average,
            sample_count: 0,
            accumulated_original_sum: 0.0,
            accumulated_modified_sum: 0.0,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Marca o início de um ciclo. Retorna `false` se já houver um em andamento.
    pub fn try_begin(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        true
    }

    /// Encerra o ciclo atual
    pub fn finish(&mut self) {
        self.active = false;
    }

    /// Acumula uma leitura e devolve as médias atualizadas
    pub fn record(&mut self, reading: &Reading) -> Averages {
        self.sample_count += 1;
        self.accumulated_original_sum += reading.heart_rate;
        self.accumulated_modified_sum += reading.modified_heart_rate;
        self.averages()
    }

    pub fn averages(&self) -> Averages {
        if self.sample_count == 0 {
            return Averages {
                original: 0.0,
                modified: 0.0,
                samples: 0,
            };
        }
        let count = self.sample_count as f64;
        Averages {
            original: self.accumulated_original_sum / count,
            modified: self.accumulated_modified_sum / count,
            samples: self.sample_count,
        }
    }
}

/// Sorteia o batimento de repouso de um residente
pub fn random_baseline<R: Rng + ?Sized>(range: RangeInclusive<u32>, rng: &mut R) -> u32 {
    rng.gen_range(range)
}
