use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::api::ResidentId;
use crate::simulation::heart_data::{CriticalKind, Reading};
use crate::simulation::state::Averages;

/// Linha do arquivo CSV de leituras
#[derive(Debug, Serialize)]
struct LogRecord {
    timestamp: String,
    resident: ResidentId,
    heart_rate: f64,
    modified_heart_rate: f64,
    average_original: f64,
    average_modified: f64,
    critical: Option<CriticalKind>,
}

/// Registro das leituras simuladas em CSV
pub struct ReadingLog {
    writer: Mutex<csv::Writer<Box<dyn Write + Send>>>,
}

impl ReadingLog {
    /// Abre (ou cria) o arquivo em modo de anexação; o cabeçalho só é escrito em arquivo vazio
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let empty = file.metadata()?.len() == 0;
        Ok(Self::build(Box::new(file), empty))
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self::build(writer, true)
    }

    fn build(writer: Box<dyn Write + Send>, has_headers: bool) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(has_headers)
            .from_writer(writer);
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Registra uma leitura; erros de escrita apenas vão para o log
    pub fn record(
        &self,
        resident: ResidentId,
        reading: &Reading,
        averages: &Averages,
        critical: Option<CriticalKind>,
    ) {
        let record = LogRecord {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            resident,
            heart_rate: reading.heart_rate,
            modified_heart_rate: reading.modified_heart_rate,
            average_original: averages.original,
            average_modified: averages.modified,
            critical,
        };

        let Ok(mut writer) = self.writer.lock() else {
            log::error!("Registro de leituras indisponível");
            return;
        };
        if let Err(e) = writer.serialize(&record) {
            log::error!("Erro ao escrever no arquivo de log: {}", e);
            return;
        }
        if let Err(e) = writer.flush() {
            log::error!("Erro ao gravar arquivo de log: {}", e);
        }
    }
}
