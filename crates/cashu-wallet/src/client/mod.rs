//! Mint client
//!
//! [`MintConnector`] is the boundary the wallet talks through; tests supply
//! fakes, production uses [`HttpClient`]. Every request runs through the
//! shared [`NetworkPolicy`] pipeline.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use cashu_core::nuts::{
    CheckStateRequest, CheckStateResponse, Id, KeySet, KeysResponse, KeysetResponse,
    MeltBolt11Request, MeltQuoteBolt11Request, MeltQuoteBolt11Response, MintBolt11Response,
    MintInfo, MintQuoteBolt11Request, MintQuoteBolt11Response, MintRequest, RestoreRequest,
    RestoreResponse, SwapRequest, SwapResponse,
};
use cashu_core::MintUrl;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use crate::error::{Error, ErrorResponse};
use crate::policy::NetworkPolicy;

/// Interface the wallet uses to reach a mint
#[async_trait]
pub trait MintConnector: Debug + Send + Sync {
    /// Get mint info [NUT-06]
    async fn get_mint_info(&self) -> Result<MintInfo, Error>;

    /// Get all active keys [NUT-01]
    async fn get_mint_keys(&self) -> Result<Vec<KeySet>, Error>;

    /// Get keys of a specific keyset [NUT-01]
    async fn get_keyset_keys(&self, keyset_id: Id) -> Result<KeySet, Error>;

    /// Get all keysets [NUT-02]
    async fn get_mint_keysets(&self) -> Result<KeysetResponse, Error>;

    /// Request a mint quote [NUT-04]
    async fn post_mint_quote(
        &self,
        request: MintQuoteBolt11Request,
    ) -> Result<MintQuoteBolt11Response, Error>;

    /// Poll a mint quote [NUT-04]
    async fn get_mint_quote_status(
        &self,
        quote_id: &str,
    ) -> Result<MintQuoteBolt11Response, Error>;

    /// Mint tokens [NUT-04]
    async fn post_mint(&self, request: MintRequest) -> Result<MintBolt11Response, Error>;

    /// Request a melt quote [NUT-05]
    async fn post_melt_quote(
        &self,
        request: MeltQuoteBolt11Request,
    ) -> Result<MeltQuoteBolt11Response, Error>;

    /// Poll a melt quote [NUT-05]
    async fn get_melt_quote_status(
        &self,
        quote_id: &str,
    ) -> Result<MeltQuoteBolt11Response, Error>;

    /// Melt [NUT-05] with optional NUT-08 fee-return outputs
    async fn post_melt(&self, request: MeltBolt11Request)
        -> Result<MeltQuoteBolt11Response, Error>;

    /// Swap proofs [NUT-03]
    async fn post_swap(&self, request: SwapRequest) -> Result<SwapResponse, Error>;

    /// Check proof states [NUT-07]
    async fn post_check_state(
        &self,
        request: CheckStateRequest,
    ) -> Result<CheckStateResponse, Error>;

    /// Restore signatures [NUT-09]
    async fn post_restore(&self, request: RestoreRequest) -> Result<RestoreResponse, Error>;
}

/// HTTP mint client
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    mint_url: MintUrl,
    policy: Arc<NetworkPolicy>,
    auth_token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    /// Create new [`HttpClient`] for a mint
    pub fn new(mint_url: MintUrl, policy: Arc<NetworkPolicy>) -> Self {
        Self {
            inner: reqwest::Client::new(),
            mint_url,
            policy,
            auth_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the NUT-22 bearer token sent in the `Authorization` header
    pub async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    fn endpoint_key(url: &Url) -> String {
        format!("{}{}", url.host_str().unwrap_or_default(), url.path())
    }

    async fn http_get<R>(&self, url: Url) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let key = Self::endpoint_key(&url);

        self.policy
            .run(&key, || async {
                let mut req = self.inner.get(url.clone());

                if let Some(token) = self.auth_token.read().await.as_deref() {
                    req = req.bearer_auth(token);
                }

                let res = req.send().await?;
                Self::decode(res).await
            })
            .await
    }

    async fn http_post<B, R>(&self, url: Url, body: &B) -> Result<R, Error>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let key = Self::endpoint_key(&url);

        self.policy
            .run(&key, || async {
                let mut req = self.inner.post(url.clone()).json(body);

                if let Some(token) = self.auth_token.read().await.as_deref() {
                    req = req.bearer_auth(token);
                }

                let res = req.send().await?;
                Self::decode(res).await
            })
            .await
    }

    async fn decode<R>(res: reqwest::Response) -> Result<R, Error>
    where
        R: DeserializeOwned,
    {
        let status = res.status();
        let body: Value = res.json().await?;

        if !status.is_success() {
            let mut response = ErrorResponse::from_value(body);
            if response.code == 0 {
                response.code = status.as_u16();
            }
            return Err(response.into());
        }

        match serde_json::from_value::<R>(body.clone()) {
            Ok(decoded) => Ok(decoded),
            Err(err) => {
                tracing::warn!("Unexpected mint response: {err}");
                Err(ErrorResponse::from_value(body).into())
            }
        }
    }
}

#[async_trait]
impl MintConnector for HttpClient {
    #[instrument(skip(self))]
    async fn get_mint_info(&self) -> Result<MintInfo, Error> {
        let url = self.mint_url.join_paths(&["v1", "info"])?;
        self.http_get(url).await
    }

    #[instrument(skip(self))]
    async fn get_mint_keys(&self) -> Result<Vec<KeySet>, Error> {
        let url = self.mint_url.join_paths(&["v1", "keys"])?;
        let response: KeysResponse = self.http_get(url).await?;
        Ok(response.keysets)
    }

    #[instrument(skip(self))]
    async fn get_keyset_keys(&self, keyset_id: Id) -> Result<KeySet, Error> {
        let url = self
            .mint_url
            .join_paths(&["v1", "keys", &keyset_id.to_string()])?;

        let response: KeysResponse = self.http_get(url).await?;

        response
            .keysets
            .into_iter()
            .find(|keyset| keyset.id == keyset_id)
            .ok_or(Error::KeysetNotFound(keyset_id))
    }

    #[instrument(skip(self))]
    async fn get_mint_keysets(&self) -> Result<KeysetResponse, Error> {
        let url = self.mint_url.join_paths(&["v1", "keysets"])?;
        self.http_get(url).await
    }

    #[instrument(skip_all)]
    async fn post_mint_quote(
        &self,
        request: MintQuoteBolt11Request,
    ) -> Result<MintQuoteBolt11Response, Error> {
        let url = self.mint_url.join_paths(&["v1", "mint", "quote", "bolt11"])?;
        self.http_post(url, &request).await
    }

    #[instrument(skip(self))]
    async fn get_mint_quote_status(
        &self,
        quote_id: &str,
    ) -> Result<MintQuoteBolt11Response, Error> {
        let url = self
            .mint_url
            .join_paths(&["v1", "mint", "quote", "bolt11", quote_id])?;
        self.http_get(url).await
    }

    #[instrument(skip_all)]
    async fn post_mint(&self, request: MintRequest) -> Result<MintBolt11Response, Error> {
        let url = self.mint_url.join_paths(&["v1", "mint", "bolt11"])?;
        self.http_post(url, &request).await
    }

    #[instrument(skip_all)]
    async fn post_melt_quote(
        &self,
        request: MeltQuoteBolt11Request,
    ) -> Result<MeltQuoteBolt11Response, Error> {
        let url = self.mint_url.join_paths(&["v1", "melt", "quote", "bolt11"])?;
        self.http_post(url, &request).await
    }

    #[instrument(skip(self))]
    async fn get_melt_quote_status(
        &self,
        quote_id: &str,
    ) -> Result<MeltQuoteBolt11Response, Error> {
        let url = self
            .mint_url
            .join_paths(&["v1", "melt", "quote", "bolt11", quote_id])?;
        self.http_get(url).await
    }

    #[instrument(skip_all)]
    async fn post_melt(
        &self,
        request: MeltBolt11Request,
    ) -> Result<MeltQuoteBolt11Response, Error> {
        let url = self.mint_url.join_paths(&["v1", "melt", "bolt11"])?;
        self.http_post(url, &request).await
    }

    #[instrument(skip_all)]
    async fn post_swap(&self, request: SwapRequest) -> Result<SwapResponse, Error> {
        let url = self.mint_url.join_paths(&["v1", "swap"])?;
        self.http_post(url, &request).await
    }

    #[instrument(skip_all)]
    async fn post_check_state(
        &self,
        request: CheckStateRequest,
    ) -> Result<CheckStateResponse, Error> {
        let url = self.mint_url.join_paths(&["v1", "checkstate"])?;
        self.http_post(url, &request).await
    }

    #[instrument(skip_all)]
    async fn post_restore(&self, request: RestoreRequest) -> Result<RestoreResponse, Error> {
        let url = self.mint_url.join_paths(&["v1", "restore"])?;
        self.http_post(url, &request).await
    }
}
