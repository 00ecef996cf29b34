use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::api::ResidentId;
use crate::error::SchedulerError;
use crate::simulation::cycle::{ResidentSimulation, TriggerOutcome};

/// Mensagens que podem ser enviadas para o escalonador
pub enum SchedulerMessage {
    /// Registra um residente e inicia seu disparo periódico
    AddResident(ResidentSimulation),
    /// Dispara manualmente o ciclo de um residente
    Trigger(ResidentId),
    /// Encerra o escalonador
    Shutdown,
}

/// Residente registrado e seu disparador periódico
struct Registered {
    simulation: ResidentSimulation,
    ticker: JoinHandle<()>,
}

/// Escalonador de ciclos de simulação por residente
pub struct Scheduler {
    /// Canal para enviar mensagens ao escalonador
    pub tx: Sender<SchedulerMessage>,
    handle: JoinHandle<usize>,
}

impl Scheduler {
    /// Cria o escalonador; cada residente é disparado a cada `trigger_period`
    pub fn new(trigger_period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let handle = tokio::spawn(Self::scheduler_loop(rx, trigger_period));
        Self { tx, handle }
    }

    /// Adiciona um residente ao escalonador
    pub async fn add_resident(&self, simulation: ResidentSimulation) -> Result<(), SchedulerError> {
        self.tx
            .send(SchedulerMessage::AddResident(simulation))
            .await
            .map_err(|_| SchedulerError::Closed("falha ao adicionar residente"))
    }

    /// Dispara o ciclo de um residente fora do período
    pub async fn trigger(&self, resident_id: ResidentId) -> Result<(), SchedulerError> {
        self.tx
            .send(SchedulerMessage::Trigger(resident_id))
            .await
            .map_err(|_| SchedulerError::Closed("falha ao disparar residente"))
    }

    /// Encerra o escalonador, cancela ciclos críticos e aguarda todos ficarem ociosos.
    ///
    /// Retorna quantos residentes estavam registrados.
    pub async fn shutdown(self) -> Result<usize, SchedulerError> {
        self.tx
            .send(SchedulerMessage::Shutdown)
            .await
            .map_err(|_| SchedulerError::Closed("falha ao encerrar escalonador"))?;
        self.handle
            .await
            .map_err(|_| SchedulerError::Closed("loop do escalonador abortado"))
    }

    /// Loop principal do escalonador
    async fn scheduler_loop(mut rx: Receiver<SchedulerMessage>, trigger_period: Duration) -> usize {
        let mut residents: HashMap<ResidentId, Registered> = HashMap::new();

        while let Some(msg) = rx.recv().await {
            match msg {
                SchedulerMessage::AddResident(simulation) => {
                    let id = simulation.resident_id();
                    if residents.contains_key(&id) {
                        log::warn!("Residente {} já registrado; ignorando", id);
                        continue;
                    }
                    log::info!("Residente adicionado: {}", id);
                    let ticker = Self::spawn_ticker(simulation.clone(), trigger_period);
                    residents.insert(id, Registered { simulation, ticker });
                }
                SchedulerMessage::Trigger(id) => match residents.get(&id) {
                    Some(registered) => Self::report(id, registered.simulation.trigger()),
                    None => log::warn!("Disparo para residente desconhecido: {}", id),
                },
                SchedulerMessage::Shutdown => {
                    log::info!("Escalonador encerrando");
                    break;
                }
            }
        }

        let (simulations, tickers): (Vec<_>, Vec<_>) = residents
            .into_values()
            .map(|registered| (registered.simulation, registered.ticker))
            .unzip();

        // Nenhum disparo periódico pode iniciar um ciclo depois daqui
        for ticker in &tickers {
            ticker.abort();
        }
        futures::future::join_all(tickers).await;

        for simulation in &simulations {
            simulation.cancel();
        }
        let idle = simulations.iter().map(|simulation| simulation.wait_idle());
        futures::future::join_all(idle).await;
        simulations.len()
    }

    /// Disparo periódico de um residente; o primeiro ocorre após um período
    fn spawn_ticker(simulation: ResidentSimulation, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                Self::report(simulation.resident_id(), simulation.trigger());
            }
        })
    }

    fn report(id: ResidentId, outcome: TriggerOutcome) {
        match outcome {
            TriggerOutcome::Skipped => {
                log::debug!("Residente {}: ciclo anterior ainda ativo", id)
            }
            TriggerOutcome::Completed(reading) => {
                log::debug!("Residente {}: leitura {} bpm", id, reading.heart_rate)
            }
            TriggerOutcome::CriticalStarted(kind) => {
                log::debug!("Residente {}: evento crítico {:?}", id, kind)
            }
        }
    }
}
