use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use simulador_sinais_vitais::api::{Endpoints, HttpVitalsApi, Resident, VitalsApi};
use simulador_sinais_vitais::config::SimulatorConfig;
use simulador_sinais_vitais::kernel::Scheduler;
use simulador_sinais_vitais::simulation::ResidentSimulation;
use simulador_sinais_vitais::simulation::heart_data::{
    CRITICAL_VARIATION, CriticalKind, HOURLY_VARIATION, generate_exaggerated_heart_rate,
    generate_heart_rate,
};
use simulador_sinais_vitais::simulation::state::random_baseline;
use simulador_sinais_vitais::tasks::ReadingLog;

/// Simulador de sinais vitais dos residentes do asilo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL base da API
    #[arg(long, env = "ASILO_API_URL", default_value = "http://localhost:5000", global = true)]
    api_url: String,

    /// Rota da lista de residentes
    #[arg(long, env = "ASILO_RESIDENTS_PATH", default_value = "/api/residentes", global = true)]
    residents_path: String,

    /// Rota de envio de leituras
    #[arg(long, env = "ASILO_READINGS_PATH", default_value = "/api/lecturas", global = true)]
    readings_path: String,

    /// Rota de envio de alertas
    #[arg(long, env = "ASILO_ALERTS_PATH", default_value = "/api/alertas", global = true)]
    alerts_path: String,

    /// Arquivo CSV para registrar as leituras
    #[arg(short, long, env = "ASILO_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Semente para execuções reproduzíveis
    #[arg(long, env = "ASILO_SEED", global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simula todos os residentes com dispositivo durante um período
    Simular {
        /// Duração da simulação em segundos
        #[arg(short, long, default_value_t = 60)]
        duration: u64,

        /// Intervalo entre disparos de cada residente, em segundos
        #[arg(short, long, default_value_t = 11)]
        period: u64,

        /// Probabilidade de evento crítico por disparo (0-1)
        #[arg(short, long, default_value_t = 0.005)]
        critical_probability: f64,

        /// Menor batimento base sorteado
        #[arg(long, default_value_t = 60)]
        baseline_min: u32,

        /// Maior batimento base sorteado
        #[arg(long, default_value_t = 90)]
        baseline_max: u32,

        /// Hora fixa (0-23) no lugar do relógio local
        #[arg(long)]
        hour: Option<u32>,
    },
    /// Força um evento crítico para um residente
    Critico {
        /// Identificador do residente
        #[arg(short, long)]
        resident: i64,

        /// 1 = arritmia, 2 = bradicardia, 3 = taquicardia
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
        kind: u8,

        /// Batimento base; sorteado se ausente
        #[arg(short, long)]
        baseline: Option<u32>,

        /// Hora fixa (0-23) no lugar do relógio local
        #[arg(long)]
        hour: Option<u32>,
    },
    /// Mostra um perfil de 24 horas sem acessar a API
    Perfil {
        /// Batimento base
        #[arg(short, long, default_value_t = 70)]
        baseline: u32,
    },
}

impl Args {
    fn base_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            endpoints: Endpoints {
                base_url: self.api_url.clone(),
                residents_path: self.residents_path.clone(),
                readings_path: self.readings_path.clone(),
                alerts_path: self.alerts_path.clone(),
            },
            log_file: self.log_file.clone(),
            seed: self.seed,
            ..SimulatorConfig::default()
        }
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn build_simulation(
    resident: &Resident,
    baseline: u32,
    api: &Arc<dyn VitalsApi>,
    config: &SimulatorConfig,
    reading_log: Option<&Arc<ReadingLog>>,
) -> Option<ResidentSimulation> {
    let Some(device_id) = resident.device_id() else {
        log::warn!("Residente {} sem dispositivo; ignorado", resident.id_residente);
        return None;
    };
    let simulation =
        ResidentSimulation::builder(resident.id_residente, device_id, baseline, Arc::clone(api))
            .config(config.cycle.clone())
            .seed(config.seed)
            .reading_log(reading_log.cloned())
            .build();
    Some(simulation)
}

fn open_log(config: &SimulatorConfig) -> std::io::Result<Option<Arc<ReadingLog>>> {
    config
        .log_file
        .as_ref()
        .map(|path| ReadingLog::create(path).map(Arc::new))
        .transpose()
}

async fn simulate(
    config: SimulatorConfig,
    duration: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let api: Arc<dyn VitalsApi> = Arc::new(HttpVitalsApi::new(config.endpoints.clone())?);
    let reading_log = open_log(&config)?;
    let residents = api.list_residents().await?;
    log::info!("{} residentes recebidos da API", residents.len());

    let mut rng = rng_for(config.seed);
    let scheduler = Scheduler::new(config.trigger_period);
    for resident in &residents {
        let baseline = random_baseline(config.baseline_range.clone(), &mut rng);
        let built = build_simulation(resident, baseline, &api, &config, reading_log.as_ref());
        if let Some(simulation) = built {
            log::info!("Residente {}: batimento base {} bpm", resident.id_residente, baseline);
            scheduler.add_resident(simulation).await?;
        }
    }

    log::info!("Duração da simulação: {} segundos", duration.as_secs());
    tokio::time::sleep(duration).await;

    let count = scheduler.shutdown().await?;
    // Dá tempo para os envios pendentes
    tokio::time::sleep(Duration::from_secs(2)).await;
    log::info!("Simulação concluída para {} residentes", count);
    Ok(())
}

async fn force_critical(
    config: SimulatorConfig,
    resident_id: i64,
    kind: CriticalKind,
    baseline: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let api: Arc<dyn VitalsApi> = Arc::new(HttpVitalsApi::new(config.endpoints.clone())?);
    let reading_log = open_log(&config)?;
    let residents = api.list_residents().await?;

    let Some(resident) = residents.iter().find(|r| r.id_residente == resident_id) else {
        return Err(format!("residente {} não encontrado", resident_id).into());
    };
    let baseline = baseline.unwrap_or_else(|| {
        random_baseline(config.baseline_range.clone(), &mut rng_for(config.seed))
    });
    let built = build_simulation(resident, baseline, &api, &config, reading_log.as_ref());
    let Some(simulation) = built else {
        return Err(format!("residente {} sem dispositivo", resident_id).into());
    };

    simulation.trigger_critical(kind);
    simulation.wait_idle().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let averages = simulation.snapshot().averages();
    log::info!(
        "Evento {:?} concluído: {} leituras, média modificada {:.2} bpm",
        kind,
        averages.samples,
        averages.modified
    );
    Ok(())
}

fn print_profile(baseline: u32, seed: Option<u64>) {
    let mut rng = rng_for(seed);
    let baseline = baseline as f64;
    println!("hora,limite_normal,normal,limite_critico,exagerado");
    for hour in 0..24u32 {
        let normal = generate_heart_rate(baseline, hour, &mut rng);
        let exaggerated = generate_exaggerated_heart_rate(baseline, hour, &mut rng);
        let index = hour as usize;
        println!(
            "{:02},{},{:.2},{},{:.2}",
            hour, HOURLY_VARIATION[index], normal, CRITICAL_VARIATION[index], exaggerated
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configurar logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let mut config = args.base_config();

    match args.command {
        Command::Simular {
            duration,
            period,
            critical_probability,
            baseline_min,
            baseline_max,
            hour,
        } => {
            config.trigger_period = Duration::from_secs(period);
            config.cycle.critical_probability = critical_probability;
            config.cycle.fixed_hour = hour;
            config.baseline_range = baseline_min..=baseline_max;
            config.validate()?;
            simulate(config, Duration::from_secs(duration)).await
        }
        Command::Critico {
            resident,
            kind,
            baseline,
            hour,
        } => {
            config.cycle.fixed_hour = hour;
            config.validate()?;
            let kind = CriticalKind::from_code(kind).ok_or("tipo crítico inválido")?;
            force_critical(config, resident, kind, baseline).await
        }
        Command::Perfil { baseline } => {
            print_profile(baseline, config.seed);
            Ok(())
        }
    }
}
