use thiserror::Error;

/// Falhas de comunicação com a API do asilo
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("falha de requisição para {endpoint}: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} respondeu {status}: {body}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("resposta inválida de {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("URL inválida: {0}")]
    Url(String),
}

/// Erros de configuração do simulador
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("probabilidade crítica fora de [0, 1]: {0}")]
    Probability(f64),

    #[error("faixa de batimento base inválida: {min}..={max}")]
    BaselineRange { min: u32, max: u32 },

    #[error("hora fixa fora de 0..=23: {0}")]
    Hour(u32),

    #[error("{0} deve ser maior que zero")]
    Zero(&'static str),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Falhas de comunicação com o escalonador
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("escalonador encerrado: {0}")]
    Closed(&'static str),
}
