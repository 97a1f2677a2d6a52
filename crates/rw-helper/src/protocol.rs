//! Helper line protocol.
//!
//! Requests arrive one per line as
//! `RequestID URL SourceAddress/FQDN Ident Method key=value...`, and every
//! accepted request is answered with exactly one decision line.

use std::fmt;

/// Minimum number of space separated fields in a request line.
const MIN_FIELDS: usize = 6;

/// A request read from the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: String,
    pub url: String,
    pub client_addr: String,
    pub client_fqdn: Option<String>,
    pub ident: String,
    pub method: String,
}

impl Request {
    /// Parse one input line. Lines with too few fields yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }

        let (client_addr, client_fqdn) = match fields[2].split_once('/') {
            Some((addr, fqdn)) => (addr, Some(fqdn.to_string())),
            None => (fields[2], None),
        };

        Some(Self {
            id: fields[0].to_string(),
            url: fields[1].to_string(),
            client_addr: client_addr.to_string(),
            client_fqdn,
            ident: fields[3].to_string(),
            method: fields[4].to_string(),
        })
    }
}

/// The terminal decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Leave the request alone.
    Pass { id: String },
    /// Redirect the client to `url`.
    Redirect { id: String, url: String },
    /// Evaluation failed; `message` describes why.
    Failure { id: String, message: String },
}

impl Decision {
    /// Render the decision as a newline terminated protocol line.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pass { id } => write!(f, "{id} OK"),
            Decision::Redirect { id, url } => write!(f, "{id} OK status=301 url=\"{url}\""),
            Decision::Failure { id, message } => {
                // A line break would split the reply in two.
                let message = message.replace(['\r', '\n'], " ");
                write!(f, "{id} BH message={message}")
            }
        }
    }
}
