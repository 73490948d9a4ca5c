//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

fn url(port: u16, path: &str) -> String {
    format!("http://127.0.0.1:{port}/api{path}")
}

pub async fn get<T: DeserializeOwned>(port: u16, path: &str) -> Result<T> {
    reqwest::get(url(port, path))
        .await
        .with_context(|| format!("failed to reach parleyd on port {port} — is it running?"))?
        .json::<T>()
        .await
        .context("failed to parse response")
}

pub async fn post<T: DeserializeOwned>(port: u16, path: &str) -> Result<T> {
    reqwest::Client::new()
        .post(url(port, path))
        .send()
        .await
        .with_context(|| format!("failed to reach parleyd on port {port} — is it running?"))?
        .json::<T>()
        .await
        .context("failed to parse response")
}

pub async fn post_body<B, T>(port: u16, path: &str, body: &B) -> Result<T>
where
    B: Serialize,
    T: DeserializeOwned,
{
    reqwest::Client::new()
        .post(url(port, path))
        .json(body)
        .send()
        .await
        .with_context(|| format!("failed to reach parleyd on port {port} — is it running?"))?
        .json::<T>()
        .await
        .context("failed to parse response")
}
