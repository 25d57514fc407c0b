//! Credential presentation and request metadata

use std::collections::HashMap;

use axum::{
    extract::{Query, Request},
    http::{HeaderMap, Uri},
};

use crate::domain::usage::UNKNOWN;

/// Header carrying the raw credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter fallback for clients that cannot set headers
pub const API_KEY_QUERY_PARAM: &str = "api_key";

/// Anything a credential can be read from
pub trait CredentialSource {
    fn header(&self, name: &str) -> Option<String>;

    fn query_param(&self, name: &str) -> Option<String>;
}

impl CredentialSource for Request {
    fn header(&self, name: &str) -> Option<String> {
        header_value(self.headers(), name)
    }

    fn query_param(&self, name: &str) -> Option<String> {
        query_value(self.uri(), name)
    }
}

/// Read the presented credential. The header wins over the query parameter.
pub fn extract_credential<S>(source: &S) -> Option<String>
where
    S: CredentialSource + ?Sized,
{
    source
        .header(API_KEY_HEADER)
        .or_else(|| source.query_param(API_KEY_QUERY_PARAM))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn query_value(uri: &Uri, name: &str) -> Option<String> {
    let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;

    params.remove(name).filter(|v| !v.is_empty())
}

/// Request details captured once at gate entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub endpoint: String,
    pub method: String,
    pub ip_address: String,
    pub user_agent: String,
}

impl RequestMetadata {
    pub fn new(endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            ip_address: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
        }
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = ip_address.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn from_request(request: &Request) -> Self {
        let headers = request.headers();
        let mut metadata = Self::new(request.uri().path(), request.method().as_str());

        if let Some(ip) = client_ip(headers) {
            metadata = metadata.with_ip_address(ip);
        }
        if let Some(user_agent) = header_value(headers, "user-agent") {
            metadata = metadata.with_user_agent(user_agent);
        }

        metadata
    }
}

/// First hop of `x-forwarded-for`, else `x-real-ip`
fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_value(headers, "x-forwarded-for")
        .and_then(|forwarded| {
            forwarded
                .split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
        })
        .or_else(|| header_value(headers, "x-real-ip"))
}
