use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::Form;

use super::models::{AlertSubmission, ReadingSubmission, Resident};
use crate::error::{ApiError, ApiResult};

/// Operações da API externa usadas pelo simulador
#[async_trait]
pub trait VitalsApi: Send + Sync {
    /// Lista os residentes cadastrados
    async fn list_residents(&self) -> ApiResult<Vec<Resident>>;
    /// Envia uma leitura de ritmo cardíaco; retorna o texto de confirmação
    async fn submit_reading(&self, reading: ReadingSubmission) -> ApiResult<String>;
    /// Envia um alerta; retorna o JSON de confirmação
    async fn submit_alert(&self, alert: AlertSubmission) -> ApiResult<serde_json::Value>;
}

/// Rotas da API
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub base_url: String,
    pub residents_path: String,
    pub readings_path: String,
    pub alerts_path: String,
}

impl Endpoints {
    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn residents(&self) -> String {
        self.join(&self.residents_path)
    }

    pub fn readings(&self) -> String {
        self.join(&self.readings_path)
    }

    pub fn alerts(&self) -> String {
        self.join(&self.alerts_path)
    }
}

/// Cliente HTTP da API do asilo
pub struct HttpVitalsApi {
    endpoints: Endpoints,
    http_client: Client,
}

impl HttpVitalsApi {
    pub fn new(endpoints: Endpoints) -> ApiResult<Self> {
        let base = &endpoints.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ApiError::Url(endpoints.base_url));
        }
        Ok(Self {
            endpoints,
            http_client: Client::new(),
        })
    }

    async fn check(endpoint: &str, response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            body,
        })
    }
}

fn request_error(endpoint: &str) -> impl FnOnce(reqwest::Error) -> ApiError + '_ {
    move |source| ApiError::Request {
        endpoint: endpoint.to_string(),
        source,
    }
}

#[async_trait]
impl VitalsApi for HttpVitalsApi {
    async fn list_residents(&self) -> ApiResult<Vec<Resident>> {
        let url = self.endpoints.residents();
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(request_error(&url))?;
        let response = Self::check(&url, response).await?;

        response
            .json::<Vec<Resident>>()
            .await
            .map_err(|e| ApiError::Decode {
                endpoint: url.clone(),
                message: e.to_string(),
            })
    }

    async fn submit_reading(&self, reading: ReadingSubmission) -> ApiResult<String> {
        let url = self.endpoints.readings();
        let form = Form::new()
            .text("ResidenteId", reading.resident_id.to_string())
            .text("DispositivoId", reading.device_id.to_string())
            .text("RitmoCardiaco", reading.heart_rate.to_string());

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(request_error(&url))?;
        let response = Self::check(&url, response).await?;

        response.text().await.map_err(request_error(&url))
    }

    async fn submit_alert(&self, alert: AlertSubmission) -> ApiResult<serde_json::Value> {
        let url = self.endpoints.alerts();
        let params = [
            ("id_residente", alert.resident_id.to_string()),
            ("alertaTipo", alert.alert_type.to_string()),
            ("mensaje", alert.message),
        ];

        let response = self
            .http_client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(request_error(&url))?;
        let response = Self::check(&url, response).await?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Decode {
                endpoint: url.clone(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(base: &str) -> Endpoints {
        Endpoints {
            base_url: base.to_string(),
            residents_path: "/api/residentes".to_string(),
            readings_path: "api/lecturas".to_string(),
            alerts_path: "/api/alertas".to_string(),
        }
    }

    #[test]
    fn joins_paths_without_double_slashes() {
        let e = endpoints("http://localhost:5000/");
        assert_eq!(e.residents(), "http://localhost:5000/api/residentes");
        assert_eq!(e.readings(), "http://localhost:5000/api/lecturas");
        assert_eq!(e.alerts(), "http://localhost:5000/api/alertas");
    }

    #[test]
    fn rejects_base_without_scheme() {
        assert!(matches!(
            HttpVitalsApi::new(endpoints("localhost:5000")),
            Err(ApiError::Url(_))
        ));
        assert!(HttpVitalsApi::new(endpoints("https://asilo.example")).is_ok());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let api = HttpVitalsApi::new(endpoints("http://127.0.0.1:9")).unwrap();
        let err = api.list_residents().await.unwrap_err();
        assert!(matches!(err, ApiError::Request { .. }), "{err}");
    }
}
