use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;

use super::heart_data::{CriticalKind, Reading, generate_variation};
use super::state::{Averages, SimulationState};
use crate::api::{ReadingSubmission, ResidentId, VitalsApi};
use crate::kernel::timer::{CancelHandle, RepeatingTimer};
use crate::tasks::{ReadingLog, dispatch_alert, submit_reading};
use crate::utils::timing::{clock_label, current_hour};

/// Constante de mistura para derivar sementes por residente
const SEED_MIXING: u64 = 0x9e37_79b9_7f4a_7c15;

/// Parâmetros do ciclo de simulação
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Chance de um disparo iniciar um evento crítico
    pub critical_probability: f64,
    pub critical_repetitions: u32,
    pub critical_tick: Duration,
    /// Hora usada no lugar do relógio local
    pub fixed_hour: Option<u32>,
    /// Fonte da hora quando não há hora fixa; lida uma vez por ciclo
    pub hour_source: fn() -> u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            critical_probability: 0.005,
            critical_repetitions: 10,
            critical_tick: Duration::from_secs(1),
            fixed_hour: None,
            hour_source: current_hour,
        }
    }
}

/// Resultado de um disparo do ciclo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerOutcome {
    /// Já havia um ciclo em andamento
    Skipped,
    /// Leitura única enviada
    Completed(Reading),
    /// Sequência crítica iniciada em segundo plano
    CriticalStarted(CriticalKind),
}

/// Sorteia se um disparo é crítico e, se for, o tipo do evento
pub fn draw_critical_kind<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> Option<CriticalKind> {
    let critical = rng.gen_range(0.0..1.0) < probability;
    critical.then(|| CriticalKind::pick(rng))
}

struct Shared {
    state: SimulationState,
    rng: StdRng,
    cancel: Option<CancelHandle>,
}

struct Core {
    resident_id: ResidentId,
    device_id: i64,
    config: CycleConfig,
    api: Arc<dyn VitalsApi>,
    log: Option<Arc<ReadingLog>>,
    shared: Mutex<Shared>,
    active: watch::Sender<bool>,
}

/// Monta uma `ResidentSimulation`
pub struct SimulationBuilder {
    resident_id: ResidentId,
    device_id: i64,
    baseline_average: u32,
    api: Arc<dyn VitalsApi>,
    config: CycleConfig,
    seed: Option<u64>,
    reading_log: Option<Arc<ReadingLog>>,
}

impl SimulationBuilder {
    pub fn config(mut self, config: CycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Semente global; cada residente deriva a sua a partir dela
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Registro CSV das leituras
    pub fn reading_log(mut self, reading_log: Option<Arc<ReadingLog>>) -> Self {
        self.reading_log = reading_log;
        self
    }

    pub fn build(self) -> ResidentSimulation {
        let rng = match self.seed {
            Some(seed) => {
                let mixed = (self.resident_id as u64).wrapping_mul(SEED_MIXING);
                StdRng::seed_from_u64(seed ^ mixed)
            }
            None => StdRng::from_entropy(),
        };
        let (active, _) = watch::channel(false);

        ResidentSimulation {
            core: Arc::new(Core {
                resident_id: self.resident_id,
                device_id: self.device_id,
                config: self.config,
                api: self.api,
                log: self.reading_log,
                shared: Mutex::new(Shared {
                    state: SimulationState::new(self.baseline_average),
                    rng,
                    cancel: None,
                }),
                active,
            }),
        }
    }
}

/// Simulação de sinais vitais de um residente
#[derive(Clone)]
pub struct ResidentSimulation {
    core: Arc<Core>,
}

impl ResidentSimulation {
    pub fn builder(
        resident_id: ResidentId,
        device_id: i64,
        baseline_average: u32,
        api: Arc<dyn VitalsApi>,
    ) -> SimulationBuilder {
        SimulationBuilder {
            resident_id,
            device_id,
            baseline_average,
            api,
            config: CycleConfig::default(),
            seed: None,
            reading_log: None,
        }
    }

    pub fn resident_id(&self) -> ResidentId {
        self.core.resident_id
    }

    pub fn is_active(&self) -> bool {
        self.core.lock().state.is_active()
    }

    /// Cópia do estado acumulado
    pub fn snapshot(&self) -> SimulationState {
        self.core.lock().state.clone()
    }

    /// Dispara um ciclo: leitura única ou, com pequena chance, sequência crítica
    pub fn trigger(&self) -> TriggerOutcome {
        self.begin(None)
    }

    /// Força uma sequência crítica do tipo informado
    pub fn trigger_critical(&self, kind: CriticalKind) -> TriggerOutcome {
        self.begin(Some(kind))
    }

    /// Interrompe uma sequência crítica em andamento (sem enviar alerta)
    pub fn cancel(&self) {
        if let Some(cancel) = self.core.lock().cancel.take() {
            cancel.cancel();
        }
    }

    /// Aguarda até que não haja ciclo ativo
    pub async fn wait_idle(&self) {
        let mut rx = self.core.active.subscribe();
        if rx.wait_for(|active| !*active).await.is_err() {
            log::debug!("Canal de estado do residente {} encerrado", self.core.resident_id);
        }
    }

    fn begin(&self, forced: Option<CriticalKind>) -> TriggerOutcome {
        let core = &self.core;
        let critical = {
            let mut guard = core.lock();
            let Shared { state, rng, cancel } = &mut *guard;
            if !state.try_begin() {
                log::info!(
                    "Simulação já ativa para residente {}; disparo ignorado",
                    core.resident_id
                );
                return TriggerOutcome::Skipped;
            }
            core.active.send_replace(true);

            // O handle é registrado antes do temporizador existir
            forced
                .or_else(|| draw_critical_kind(rng, core.config.critical_probability))
                .map(|kind| {
                    let handle = CancelHandle::new();
                    *cancel = Some(handle.clone());
                    (kind, handle)
                })
        };

        match critical {
            None => TriggerOutcome::Completed(Core::run_single(core)),
            Some((kind, cancel)) => {
                Core::start_critical(core, kind, cancel);
                TriggerOutcome::CriticalStarted(kind)
            }
        }
    }
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn hour(&self) -> u32 {
        self.config.fixed_hour.unwrap_or_else(self.config.hour_source)
    }

    fn finish(&self) {
        let mut guard = self.lock();
        guard.cancel = None;
        guard.state.finish();
        self.active.send_replace(false);
    }

    /// Gera, acumula e registra uma leitura
    fn sample(&self, hour: u32, kind: Option<CriticalKind>) -> (Reading, Averages) {
        let (reading, averages) = {
            let mut guard = self.lock();
            let Shared { state, rng, .. } = &mut *guard;
            let baseline = state.baseline_average as f64;
            let reading = generate_variation(baseline, hour, kind, rng).rounded();
            (reading, state.record(&reading))
        };

        if let Some(reading_log) = &self.log {
            reading_log.record(self.resident_id, &reading, &averages, kind);
        }
        (reading, averages)
    }

    fn submit(&self, bpm: f64) {
        let submission = ReadingSubmission::new(self.resident_id, self.device_id, bpm);
        submit_reading(Arc::clone(&self.api), submission);
    }

    fn run_single(core: &Arc<Core>) -> Reading {
        let (reading, averages) = core.sample(core.hour(), None);
        log::info!(
            "[{}] Residente {}: {} bpm (média {:.2} em {} leituras)",
            clock_label(),
            core.resident_id,
            reading.heart_rate,
            averages.original,
            averages.samples
        );

        core.submit(reading.heart_rate);
        core.finish();
        reading
    }

    fn start_critical(core: &Arc<Core>, kind: CriticalKind, cancel: CancelHandle) {
        let hour = core.hour();
        let repetitions = core.config.critical_repetitions;
        log::warn!(
            "Residente {}: iniciando evento crítico {:?} ({} leituras, hora {})",
            core.resident_id,
            kind,
            repetitions,
            hour
        );

        let ticking = Arc::clone(core);
        let on_tick = move |n: u32| {
            let (reading, averages) = ticking.sample(hour, Some(kind));
            log::warn!(
                "Residente {} [{}/{}]: {} bpm -> {} bpm (média modificada {:.2})",
                ticking.resident_id,
                n,
                repetitions,
                reading.heart_rate,
                reading.modified_heart_rate,
                averages.modified
            );
            ticking.submit(reading.modified_heart_rate);
        };
        let timer = RepeatingTimer::spawn_with_cancel(
            cancel,
            core.config.critical_tick,
            repetitions,
            on_tick,
        );

        let finishing = Arc::clone(core);
        tokio::spawn(async move {
            let fired = timer.join().await;
            if fired == repetitions {
                dispatch_alert(Arc::clone(&finishing.api), finishing.resident_id, kind);
            } else {
                log::warn!(
                    "Evento crítico do residente {} interrompido após {} leituras",
                    finishing.resident_id,
                    fired
                );
            }
            finishing.finish();
        });
    }
}
