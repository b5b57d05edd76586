//! HTTP client for the decision-analysis service

use crate::api::{
    CounterfactualApi, CounterfactualId, ExecutionId, PollResponse, SubmitRequest, SubmitResponse,
};
use crate::config::CfaConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, Response, Url};

/// reqwest-backed [`CounterfactualApi`]
#[derive(Debug, Clone)]
pub struct HttpCounterfactualApi {
    client: Client,
    base: Url,
}

impl HttpCounterfactualApi {
    /// Build a client honouring the configured timeout
    ///
    /// # Errors
    /// `Client` if `base_url` is not an absolute http(s) URL or the TLS
    /// backend cannot be set up.
    pub fn new(config: &CfaConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Client(format!("invalid base_url {:?}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Client(format!(
                "base_url {:?} cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Service root
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append `segments` to the service root, percent-encoding each one
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn jobs_url(&self, execution: &ExecutionId) -> Url {
        self.endpoint([
            "executions",
            "decisions",
            execution.as_str(),
            "explanations",
            "counterfactuals",
        ])
    }

    fn job_url(&self, execution: &ExecutionId, job: &CounterfactualId) -> Url {
        let mut url = self.jobs_url(execution);
        if let Ok(mut path) = url.path_segments_mut() {
            path.push(job.as_str());
        }
        url
    }
}

/// Turn non-2xx replies into [`ApiError::Status`]
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CounterfactualApi for HttpCounterfactualApi {
    async fn submit(
        &self,
        execution: &ExecutionId,
        request: &SubmitRequest,
    ) -> Result<CounterfactualId, ApiError> {
        let url = self.jobs_url(execution);
        tracing::debug!("POST {}", url);

        let response = self.client.post(url).json(request).send().await?;
        let reply: SubmitResponse = check_status(response).await?.json().await?;
        Ok(reply.counterfactual_id)
    }

    async fn poll(
        &self,
        execution: &ExecutionId,
        job: &CounterfactualId,
    ) -> Result<PollResponse, ApiError> {
        let url = self.job_url(execution, job);
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        Ok(check_status(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str) -> HttpCounterfactualApi {
        HttpCounterfactualApi::new(&CfaConfig::new().with_base_url(base_url)).unwrap()
    }

    #[test]
    fn urls_follow_service_layout() {
        let api = api("http://svc:9000/");
        let execution = ExecutionId::new("exec-1");
        assert_eq!(
            api.jobs_url(&execution).as_str(),
            "http://svc:9000/executions/decisions/exec-1/explanations/counterfactuals"
        );
        assert_eq!(
            api.job_url(&execution, &CounterfactualId::new("cf-7")).as_str(),
            "http://svc:9000/executions/decisions/exec-1/explanations/counterfactuals/cf-7"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let api = api("https://gateway.example/trusty/");
        assert_eq!(
            api.jobs_url(&ExecutionId::new("e")).as_str(),
            "https://gateway.example/trusty/executions/decisions/e/explanations/counterfactuals"
        );
    }

    #[test]
    fn ids_are_percent_encoded() {
        let api = api("http://svc:9000");
        let url = api.job_url(&ExecutionId::new("a/b c"), &CounterfactualId::new("cf?x#1"));
        assert_eq!(
            url.as_str(),
            "http://svc:9000/executions/decisions/a%2Fb%20c/explanations/counterfactuals/cf%3Fx%231"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path_segments().map(Iterator::count), Some(6));
    }

    #[test]
    fn unparseable_base_is_client_error() {
        let err = HttpCounterfactualApi::new(&CfaConfig::new().with_base_url("not a url")).unwrap_err();
        assert!(matches!(err, ApiError::Client(ref msg) if msg.contains("base_url")));
    }
}
