use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant};

use simulador_sinais_vitais::api::{AlertSubmission, ReadingSubmission, Resident, VitalsApi};
use simulador_sinais_vitais::error::{ApiError, ApiResult};
use simulador_sinais_vitais::kernel::Scheduler;
use simulador_sinais_vitais::simulation::{
    CriticalKind, CycleConfig, ResidentSimulation, TriggerOutcome,
};
use simulador_sinais_vitais::tasks::ReadingLog;

/// API falsa que registra tudo o que recebe
#[derive(Default)]
struct RecordingApi {
    readings: Mutex<Vec<ReadingSubmission>>,
    alerts: Mutex<Vec<AlertSubmission>>,
    failing: bool,
}

impl RecordingApi {
    fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn readings(&self) -> Vec<ReadingSubmission> {
        self.readings.lock().unwrap().clone()
    }

    fn alerts(&self) -> Vec<AlertSubmission> {
        self.alerts.lock().unwrap().clone()
    }

    fn offline() -> ApiError {
        ApiError::Decode {
            endpoint: "fake".to_string(),
            message: "offline".to_string(),
        }
    }
}

#[async_trait]
impl VitalsApi for RecordingApi {
    async fn list_residents(&self) -> ApiResult<Vec<Resident>> {
        Ok(Vec::new())
    }

    async fn submit_reading(&self, reading: ReadingSubmission) -> ApiResult<String> {
        self.readings.lock().unwrap().push(reading);
        if self.failing {
            return Err(Self::offline());
        }
        Ok("ok".to_string())
    }

    async fn submit_alert(&self, alert: AlertSubmission) -> ApiResult<serde_json::Value> {
        self.alerts.lock().unwrap().push(alert);
        if self.failing {
            return Err(Self::offline());
        }
        Ok(serde_json::json!({ "ok": true }))
    }
}

fn config(probability: f64) -> CycleConfig {
    CycleConfig {
        critical_probability: probability,
        fixed_hour: Some(12),
        ..CycleConfig::default()
    }
}

fn simulation(
    api: &Arc<RecordingApi>,
    resident_id: i64,
    baseline: u32,
    probability: f64,
) -> ResidentSimulation {
    let api: Arc<dyn VitalsApi> = api.clone();
    ResidentSimulation::builder(resident_id, resident_id * 10, baseline, api)
        .config(config(probability))
        .seed(Some(99))
        .build()
}

/// Relógio controlado pelo teste
static CLOCK_HOUR: AtomicU32 = AtomicU32::new(3);

fn clock_hour() -> u32 {
    CLOCK_HOUR.load(Ordering::SeqCst)
}

/// Deixa as tarefas de envio em segundo plano concluírem
async fn settle() {
    time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn non_critical_cycle_sends_one_reading_and_no_alert() {
    let api = Arc::new(RecordingApi::default());
    let sim = simulation(&api, 1, 80, 0.0);

    let outcome = sim.trigger();
    settle().await;

    let TriggerOutcome::Completed(reading) = outcome else {
        panic!("esperava leitura única, obteve {outcome:?}");
    };
    assert!((80.0..=98.0).contains(&reading.heart_rate));
    assert_eq!(reading.modified_heart_rate, 0.0);

    let readings = api.readings();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].resident_id, 1);
    assert_eq!(readings[0].device_id, 10);
    assert_eq!(readings[0].heart_rate, reading.heart_rate.round() as i64);
    assert!(api.alerts().is_empty());

    assert!(!sim.is_active());
    assert_eq!(sim.snapshot().sample_count, 1);
}

#[tokio::test(start_paused = true)]
async fn critical_cycle_sends_ten_readings_then_one_alert() {
    for kind in CriticalKind::ALL {
        let api = Arc::new(RecordingApi::default());
        let sim = simulation(&api, 2, 70, 0.0);
        let start = Instant::now();

        assert_eq!(sim.trigger_critical(kind), TriggerOutcome::CriticalStarted(kind));
        assert!(sim.is_active());
        sim.wait_idle().await;
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        settle().await;

        assert_eq!(api.readings().len(), 10);
        let alerts = api.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].resident_id, 2);
        assert_eq!(alerts[0].alert_type, kind.code());
        assert_eq!(alerts[0].message, kind.alert_message());

        let state = sim.snapshot();
        assert_eq!(state.sample_count, 10);
        assert!(!state.is_active());
    }
}

#[tokio::test(start_paused = true)]
async fn critical_readings_transmit_the_modified_value() {
    let api = Arc::new(RecordingApi::default());
    let sim = simulation(&api, 3, 70, 0.0);
    sim.trigger_critical(CriticalKind::Tachycardia);
    sim.wait_idle().await;
    settle().await;
    // Ao meio-dia o batimento normal fica entre 69.9 e 88
    assert!(api.readings().iter().all(|r| r.heart_rate >= 87));

    let api = Arc::new(RecordingApi::default());
    let sim = simulation(&api, 4, 70, 0.0);
    sim.trigger_critical(CriticalKind::Bradycardia);
    sim.wait_idle().await;
    settle().await;
    assert!(api.readings().iter().all(|r| r.heart_rate <= 61));
}

#[tokio::test(start_paused = true)]
async fn certain_probability_always_starts_a_critical_cycle() {
    let api = Arc::new(RecordingApi::default());
    let sim = simulation(&api, 5, 75, 1.0);

    assert!(matches!(sim.trigger(), TriggerOutcome::CriticalStarted(_)));
    sim.wait_idle().await;
    settle().await;

    assert_eq!(api.readings().len(), 10);
    assert_eq!(api.alerts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn trigger_while_running_is_a_no_op() {
    let api = Arc::new(RecordingApi::default());
    let sim = simulation(&api, 6, 72, 0.0);

    sim.trigger_critical(CriticalKind::Arrhythmia);
    assert_eq!(sim.trigger(), TriggerOutcome::Skipped);

    time::sleep(Duration::from_millis(1_500)).await;
    let before = api.readings().len();
    assert_eq!(sim.trigger(), TriggerOutcome::Skipped);
    assert_eq!(sim.trigger_critical(CriticalKind::Tachycardia), TriggerOutcome::Skipped);
    settle().await;
    assert_eq!(api.readings().len(), before);

    sim.wait_idle().await;
    settle().await;
    assert_eq!(api.readings().len(), 10);
    assert_eq!(api.alerts().len(), 1);
    assert_eq!(api.alerts()[0].message, "Se presenta Arritmia");

    // Depois de ocioso o residente volta a aceitar disparos
    assert!(matches!(sim.trigger(), TriggerOutcome::Completed(_)));
    settle().await;
    assert_eq!(api.readings().len(), 11);
}

#[tokio::test(start_paused = true)]
async fn failed_submissions_do_not_break_the_cycle() {
    let api = Arc::new(RecordingApi::failing());
    let sim = simulation(&api, 7, 70, 0.0);

    sim.trigger_critical(CriticalKind::Bradycardia);
    sim.wait_idle().await;
    settle().await;

    assert_eq!(api.readings().len(), 10);
    assert_eq!(api.alerts().len(), 1);
    assert!(!sim.is_active());
    assert!(matches!(sim.trigger(), TriggerOutcome::Completed(_)));
}

#[tokio::test(start_paused = true)]
async fn cancelled_cycle_skips_the_alert() {
    let api = Arc::new(RecordingApi::default());
    let sim = simulation(&api, 8, 70, 0.0);

    sim.trigger_critical(CriticalKind::Tachycardia);
    time::sleep(Duration::from_millis(3_500)).await;
    sim.cancel();
    sim.wait_idle().await;
    settle().await;

    assert_eq!(api.readings().len(), 3);
    assert!(api.alerts().is_empty());
    assert!(!sim.is_active());
}

#[tokio::test(start_paused = true)]
async fn cancel_right_after_start_sends_nothing() {
    let api = Arc::new(RecordingApi::default());
    let sim = simulation(&api, 9, 70, 0.0);

    sim.trigger_critical(CriticalKind::Arrhythmia);
    sim.cancel();
    sim.wait_idle().await;
    time::sleep(Duration::from_secs(12)).await;

    assert!(api.readings().is_empty());
    assert!(api.alerts().is_empty());
    assert!(!sim.is_active());
}

#[tokio::test(start_paused = true)]
async fn critical_cycle_keeps_the_hour_read_at_start() {
    let api = Arc::new(RecordingApi::default());
    let dyn_api: Arc<dyn VitalsApi> = api.clone();
    let config = CycleConfig {
        critical_probability: 0.0,
        hour_source: clock_hour,
        ..CycleConfig::default()
    };
    let sim = ResidentSimulation::builder(10, 100, 80, dyn_api)
        .config(config)
        .seed(Some(99))
        .build();

    CLOCK_HOUR.store(3, Ordering::SeqCst);
    sim.trigger_critical(CriticalKind::Tachycardia);
    // O relógio vira meio-dia durante a sequência
    CLOCK_HOUR.store(12, Ordering::SeqCst);
    sim.wait_idle().await;
    settle().await;

    // Às 3h a taquicardia fica em no máximo 98.64; ao meio-dia seria ao menos 100
    let readings = api.readings();
    assert_eq!(readings.len(), 10);
    assert!(readings.iter().all(|r| r.heart_rate <= 99), "{readings:?}");

    // O ciclo seguinte lê a hora nova: ao meio-dia a leitura fica acima da base
    let TriggerOutcome::Completed(reading) = sim.trigger() else {
        panic!("esperava leitura única");
    };
    assert!(reading.heart_rate >= 80.0, "{reading:?}");
}

#[tokio::test(start_paused = true)]
async fn residents_run_independently() {
    let api = Arc::new(RecordingApi::default());
    let first = simulation(&api, 11, 70, 0.0);
    let second = simulation(&api, 12, 80, 0.0);

    first.trigger_critical(CriticalKind::Arrhythmia);
    assert!(matches!(second.trigger(), TriggerOutcome::Completed(_)));
    second.trigger_critical(CriticalKind::Tachycardia);

    first.wait_idle().await;
    second.wait_idle().await;
    settle().await;

    let readings = api.readings();
    assert_eq!(readings.iter().filter(|r| r.resident_id == 11).count(), 10);
    assert_eq!(readings.iter().filter(|r| r.resident_id == 12).count(), 11);
    assert_eq!(api.alerts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn scheduler_triggers_each_resident_every_period() {
    let api = Arc::new(RecordingApi::default());
    let scheduler = Scheduler::new(Duration::from_secs(11));
    scheduler.add_resident(simulation(&api, 21, 70, 0.0)).await.unwrap();
    scheduler.add_resident(simulation(&api, 22, 75, 0.0)).await.unwrap();
    // Duplicado é ignorado
    scheduler.add_resident(simulation(&api, 22, 75, 0.0)).await.unwrap();

    time::sleep(Duration::from_secs(34)).await;
    scheduler.trigger(21).await.unwrap();
    scheduler.trigger(999).await.unwrap();
    settle().await;

    let readings = api.readings();
    assert_eq!(readings.iter().filter(|r| r.resident_id == 21).count(), 4);
    assert_eq!(readings.iter().filter(|r| r.resident_id == 22).count(), 3);

    assert_eq!(scheduler.shutdown().await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_a_running_critical_cycle() {
    let api = Arc::new(RecordingApi::default());
    let scheduler = Scheduler::new(Duration::from_secs(11));
    scheduler.add_resident(simulation(&api, 31, 70, 1.0)).await.unwrap();

    // Disparo em 11s, leituras críticas em 12s e 13s
    time::sleep(Duration::from_millis(13_500)).await;
    let start = Instant::now();
    assert_eq!(scheduler.shutdown().await.unwrap(), 1);
    assert!(start.elapsed() < Duration::from_secs(1));

    time::sleep(Duration::from_secs(20)).await;
    settle().await;
    assert_eq!(api.readings().len(), 2);
    assert!(api.alerts().is_empty());
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn clones_share_the_reading_log() {
    let api: Arc<dyn VitalsApi> = Arc::new(RecordingApi::default());
    let buffer = SharedBuffer::default();
    let reading_log = Arc::new(ReadingLog::from_writer(Box::new(buffer.clone())));
    let sim = ResidentSimulation::builder(41, 410, 70, api)
        .config(config(0.0))
        .seed(Some(99))
        .reading_log(Some(reading_log))
        .build();
    let clone = sim.clone();

    assert!(matches!(clone.trigger(), TriggerOutcome::Completed(_)));
    assert!(matches!(sim.trigger(), TriggerOutcome::Completed(_)));
    settle().await;

    let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.contains(",41,")), "{text}");
}
