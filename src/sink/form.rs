// src/sink/form.rs
// Google Form submission: POST to formResponse, or GET with the fields as a
// prefilled query when POST is refused.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use super::Transport;
use crate::config::consts::{FORM_SUCCESS_MARKERS, USER_AGENT};
use crate::config::options::SinkOptions;
use crate::errors::{RelayError, Result};
use crate::record::Metadata;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMethod {
    Post,
    Get,
}

pub struct FormTransport {
    http: Client,
    url: Url,
    name_entry: String,
    amount_entry: String,
    method: FormMethod,
    name: &'static str,
}

impl FormTransport {
    pub fn new(sink: &SinkOptions, method: FormMethod, timeout: Duration) -> Result<Self> {
        let url = Url::parse(&sink.form_url)
            .map_err(|e| RelayError::Configuration(format!("GOOGLE_FORM_URL '{}': {e}", sink.form_url)))?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RelayError::Configuration(format!("http client: {e}")))?;
        Ok(Self {
            http,
            url,
            name_entry: sink.name_entry.clone(),
            amount_entry: sink.amount_entry.clone(),
            method,
            name: match method { FormMethod::Post => "form-post", FormMethod::Get => "form-get" },
        })
    }

    /// Prefill-style URL: `?usp=pp_url&<name>=..&<amount>=..&submit=Submit`.
    pub fn prefill_url(&self, identity: &str, amount: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("usp", "pp_url")
            .append_pair(&self.name_entry, identity)
            .append_pair(&self.amount_entry, amount)
            .append_pair("submit", "Submit");
        url
    }
}

impl Transport for FormTransport {
    fn name(&self) -> &str { self.name }

    fn submit(&mut self, identity: &str, amount: &str, _metadata: &Metadata) -> Result<bool> {
        let req = match self.method {
            FormMethod::Post => self.http.post(self.url.clone()).form(&[
                (self.name_entry.as_str(), identity),
                (self.amount_entry.as_str(), amount),
            ]),
            FormMethod::Get => self.http.get(self.prefill_url(identity, amount)),
        };
        let resp = req.send().map_err(|e| RelayError::transport(self.name, e))?;
        let status = resp.status();
        let final_url = resp.url().to_string();
        let body = resp.text().map_err(|e| RelayError::transport(self.name, e))?;
        debug!(transport = self.name, %status, %final_url, "form response");
        Ok(is_success(status.is_success(), &body))
    }
}

/// 2xx plus a confirmation marker in the returned page.
pub fn is_success(status_ok: bool, body: &str) -> bool {
    status_ok && FORM_SUCCESS_MARKERS.iter().any(|m| body.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_needs_status_and_confirmation() {
        let confirmed = r#"<div class="freebirdFormviewerViewResponseConfirmationMessage">Your response has been recorded.</div>"#;
        assert!(is_success(true, confirmed));
        assert!(is_success(true, "<div>ระบบได้บันทึกคำตอบของคุณแล้ว</div>"));
        assert!(!is_success(false, confirmed));
    }

    #[test]
    fn plain_ok_from_the_submit_endpoint_is_not_success() {
        // A 200 that re-renders the form (e.g. a validation error) carries no confirmation.
        assert!(!is_success(true, "<form action=\"https://docs.google.com/forms/d/e/x/formResponse\">"));
        assert!(!is_success(true, ""));
    }

    #[test]
    fn prefill_url_carries_entries() {
        let t = FormTransport::new(&SinkOptions::default(), FormMethod::Get, Duration::from_secs(1)).unwrap();
        let url = t.prefill_url("Alice Smith", "1234.50");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&(s!("usp"), s!("pp_url"))));
        assert!(pairs.contains(&(s!("entry.683444359"), s!("Alice Smith"))));
        assert!(pairs.contains(&(s!("entry.290745485"), s!("1234.50"))));
        assert_eq!(t.name(), "form-get");
    }

    #[test]
    fn bad_form_url_is_configuration_error() {
        let mut opts = SinkOptions::default();
        opts.form_url = s!("not a url");
        let err = FormTransport::new(&opts, FormMethod::Post, Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, RelayError::Configuration(_)));
    }
}
