//! Http client for the hosted backend.
//!
//! Identity operations go to `/auth/v1/*`, records to `/rest/v1/<collection>`
//! using the PostgREST filter syntax.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::backend::{
    Collection, Config, Credentials, Identity, Query, Record, Records, SignUpOutcome, Subscription,
};
use crate::common::{debug, info, warn, ErrorKind};
use crate::core::{Principal, PrincipalId};
use crate::{Result, SiakadError};

const CHANGE_CHANNEL_CAPACITY: usize = 16;
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
// PostgREST code for a single object request which did not yield exactly one row.
const NOT_SINGULAR: &str = "PGRST116";

pub struct RestBackend {
    base: Url,
    anon_key: String,
    client: reqwest::Client,
    session: RwLock<Option<Principal>>,
    changes: broadcast::Sender<Option<Principal>>,
}

impl RestBackend {
    pub fn new(url: &str, anon_key: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let base = Url::parse(&format!("{}/", url.trim_end_matches('/'))).map_err(|err| {
            SiakadError::from(ErrorKind::Config(format!("invalid url {}: {}", url, err)))
        })?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            base,
            anon_key: anon_key.into(),
            client,
            session: RwLock::new(None),
            changes,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config
            .url()
            .ok_or_else(|| ErrorKind::Config("backend url is required".into()))?;
        let anon_key = config
            .anon_key()
            .ok_or_else(|| ErrorKind::Config("backend anon_key is required".into()))?;

        RestBackend::new(url, anon_key, config.request_timeout())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|err| {
            SiakadError::from(ErrorKind::Internal(format!("join {}: {}", path, err)))
        })
    }

    fn records_endpoint(&self, collection: Collection) -> Result<Url> {
        self.endpoint(&format!("rest/v1/{}", collection))
    }

    fn session(&self) -> Option<Principal> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_session(&self, principal: Option<Principal>) -> Option<Principal> {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *session, principal)
    }

    fn notify(&self, change: Option<Principal>) {
        let _ = self.changes.send(change);
    }

    // Requests run with the session token when signed in, with the public key otherwise.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self
            .session()
            .map(|principal| principal.access_token().to_owned())
            .unwrap_or_else(|| self.anon_key.clone());

        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", token))
    }

    fn establish(&self, session: TokenResponse) -> Principal {
        let now = Utc::now();
        let principal = Principal::new(
            session.user.id,
            session.user.email,
            session.access_token,
            now,
            now + chrono::Duration::seconds(session.expires_in),
        );
        self.replace_session(Some(principal.clone()));
        self.notify(Some(principal.clone()));
        principal
    }

    // Local session is already cleared, tell the service to drop the token.
    async fn revoke(&self, principal: Principal) -> Result<()> {
        self.notify(None);

        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", principal.access_token()),
            )
            .send()
            .await?;
        if let Err(err) = ensure_success(response).await {
            warn!(%err, "Remote sign out failed");
            return Err(err);
        }
        Ok(())
    }

    async fn represented(response: Response) -> Result<u64> {
        let response = ensure_success(response).await?;
        let records: Vec<Record> = response.json().await?;
        Ok(records.len() as u64)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: UserResponse,
}

#[derive(Deserialize)]
struct UserResponse {
    id: PrincipalId,
    email: Option<String>,
    #[serde(default)]
    identities: Option<Vec<Value>>,
}

// Error body of both the identity and the record endpoints.
#[derive(Deserialize, Default, Debug)]
struct ErrorBody {
    code: Option<Value>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
    details: Option<String>,
}

impl ErrorBody {
    fn decode(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| ErrorBody {
            message: Some(body.to_owned()).filter(|b| !b.is_empty()),
            ..Default::default()
        })
    }

    fn code(&self) -> Option<String> {
        self.error_code.clone().or_else(|| {
            self.code.as_ref().map(|code| match code {
                Value::String(code) => code.clone(),
                other => other.to_string(),
            })
        })
    }

    fn message(&self) -> Option<String> {
        self.error_description
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.msg.clone())
            .or_else(|| self.error.clone())
    }

    // Zero rows for a single object request. More than one row stays a fault.
    fn is_no_rows(&self, status: u16) -> bool {
        status == 406
            && self.code().as_deref() == Some(NOT_SINGULAR)
            && self
                .details
                .as_deref()
                .map_or(true, |details| details.contains(" 0 rows"))
    }

    fn into_error(self, status: u16) -> SiakadError {
        let message = self
            .message()
            .unwrap_or_else(|| format!("request failed with status {}", status));
        SiakadError::from(ErrorKind::Backend {
            status: Some(status),
            code: self.code(),
            message,
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ErrorBody::decode(&body).into_error(status))
}

fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl Identity for RestBackend {
    async fn current_principal(&self) -> Option<Principal> {
        let principal = self.session()?;
        if principal.is_expired() {
            info!(id=%principal.id(), "Session expired");
            self.replace_session(None);
            self.notify(None);
            return None;
        }
        Some(principal)
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.changes.subscribe())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Principal> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .request(Method::POST, url)
            .json(&json!({"email": credentials.email, "password": credentials.password}))
            .send()
            .await?;
        let session: TokenResponse = ensure_success(response).await?.json().await?;

        let principal = self.establish(session);
        info!(id=%principal.id(), "Signed in");
        Ok(principal)
    }

    async fn sign_up(&self, credentials: &Credentials, metadata: Record) -> Result<SignUpOutcome> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .request(Method::POST, url)
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
                "data": metadata,
            }))
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;

        // Auto confirmed projects answer with a session, others with the bare user.
        if body.get("access_token").is_some() {
            let session: TokenResponse = serde_json::from_value(body)?;
            let principal = self.establish(session);
            return Ok(SignUpOutcome::Registered(principal.id().clone()));
        }
        let user: UserResponse = serde_json::from_value(body)?;
        match user.identities {
            Some(identities) if identities.is_empty() => Ok(SignUpOutcome::AlreadyRegistered),
            _ => Ok(SignUpOutcome::Registered(user.id)),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        match self.replace_session(None) {
            Some(principal) => self.revoke(principal).await,
            None => {
                debug!("Sign out without session");
                Ok(())
            }
        }
    }

    async fn sign_out_principal(&self, id: &PrincipalId) -> Result<bool> {
        let ended = {
            let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
            match session.as_ref() {
                Some(principal) if principal.id() == id => session.take(),
                _ => None,
            }
        };
        match ended {
            Some(principal) => self.revoke(principal).await.map(|()| true),
            None => {
                debug!(%id, "No session of the principal to sign out");
                Ok(false)
            }
        }
    }

    async fn update_password(&self, password: &str) -> Result<()> {
        if self.session().is_none() {
            return Err(SiakadError::Unauthenticated);
        }
        let url = self.endpoint("auth/v1/user")?;
        let response = self
            .request(Method::PUT, url)
            .json(&json!({ "password": password }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Records for RestBackend {
    async fn find_one(&self, collection: Collection, query: &Query) -> Result<Option<Record>> {
        let response = self
            .request(Method::GET, self.records_endpoint(collection)?)
            .query(&[("select", "*")])
            .query(&query.to_params())
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(Some(response.json().await?));
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = ErrorBody::decode(&body);
        if error.is_no_rows(status) {
            return Ok(None);
        }
        Err(error.into_error(status))
    }

    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Record>> {
        let response = self
            .request(Method::GET, self.records_endpoint(collection)?)
            .query(&[("select", "*")])
            .query(&query.to_params())
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64> {
        let response = self
            .request(Method::HEAD, self.records_endpoint(collection)?)
            .query(&[("select", "*")])
            .query(&query.to_params())
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| {
                SiakadError::backend(None, format!("count of {} missing content range", collection))
            })
    }

    async fn insert(&self, collection: Collection, record: Record) -> Result<()> {
        let response = self
            .request(Method::POST, self.records_endpoint(collection)?)
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn update(&self, collection: Collection, query: &Query, patch: Record) -> Result<u64> {
        let response = self
            .request(Method::PATCH, self.records_endpoint(collection)?)
            .query(&query.to_params())
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        RestBackend::represented(response).await
    }

    async fn delete(&self, collection: Collection, query: &Query) -> Result<u64> {
        let response = self
            .request(Method::DELETE, self.records_endpoint(collection)?)
            .query(&query.to_params())
            .header("Prefer", "return=representation")
            .send()
            .await?;
        RestBackend::represented(response).await
    }
}
