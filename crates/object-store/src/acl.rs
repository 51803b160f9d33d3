//! Container access control lists.
//!
//! Swift access control is split into two permissions: READ grants
//! retrieval (GET, HEAD), WRITE grants any modification. WRITE does not
//! imply READ. Access can be granted to accounts (optionally narrowed
//! to users), to requesting hosts by name or pattern, or as the
//! distinct capability to list a container's contents.
//!
//! Rules travel inside two HTTP headers, `X-Container-Read` and
//! `X-Container-Write`, each holding a comma-separated chain of rule
//! tokens:
//!
//! - `.r:<host>` — referrer rule (`*` any host, `.example.com` domain
//!   form, `-host` denial)
//! - `.rlistings` — listings permission
//! - `<account>` or `<account>:<user>` — account rule

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Read permission flag.
pub const READ: u8 = 1;
/// Write permission flag.
pub const WRITE: u8 = 2;
/// Shorthand for READ | WRITE.
pub const READ_WRITE: u8 = READ | WRITE;

/// Header carrying READ rules.
pub const HEADER_READ: &str = "X-Container-Read";
/// Header carrying WRITE rules.
pub const HEADER_WRITE: &str = "X-Container-Write";

static RULE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\.r:([a-zA-Z0-9*.\-]+)|\.(rlistings)|([a-zA-Z0-9]+)(?::([a-zA-Z0-9]+))?)\s*$")
        .unwrap()
});

/// What a rule grants access to. The three forms are mutually
/// exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// A requesting-host name or pattern.
    Referrer(String),
    /// Permission to list the container's contents.
    Listings,
    /// A specific account; an empty user list means every user on the
    /// account.
    Account {
        account: String,
        users: Vec<String>,
    },
}

/// One access rule: a permission mask plus what it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub mask: u8,
    pub grant: Grant,
}

/// Parse a single rule token under the given permission mask.
///
/// Tokens that do not match the grammar yield `None`. That is the
/// contract, not a fallback: malformed entries are dropped silently
/// and never abort parsing of their neighbors.
pub fn parse_rule(mask: u8, token: &str) -> Option<Rule> {
    let caps = RULE_PATTERN.captures(token)?;
    let grant = if let Some(host) = caps.get(1) {
        Grant::Referrer(host.as_str().to_string())
    } else if caps.get(2).is_some() {
        Grant::Listings
    } else if let Some(account) = caps.get(3) {
        let users = caps
            .get(4)
            .map(|u| vec![u.as_str().to_string()])
            .unwrap_or_default();
        Grant::Account {
            account: account.as_str().to_string(),
            users,
        }
    } else {
        return None;
    };
    Some(Rule { mask, grant })
}

/// Render a rule as a wire token for the given permission.
///
/// Under READ, referrer and listings forms take precedence; account
/// rules render the same way for both permissions. A rule with no
/// renderable form for the permission yields `None` and is excluded
/// from the header.
pub fn rule_to_string(perm: u8, rule: &Rule) -> Option<String> {
    if perm & READ != 0 {
        match &rule.grant {
            Grant::Referrer(host) => return Some(format!(".r:{}", host)),
            Grant::Listings => return Some(".rlistings".to_string()),
            Grant::Account { .. } => {}
        }
    }

    match &rule.grant {
        Grant::Account { account, users } => {
            if users.is_empty() {
                Some(account.clone())
            } else {
                // One account:user token per user. The join lands
                // inside the outer header join, flattening the rule
                // into per-user tokens; each piece is independently
                // valid wire syntax, so nothing is lost on the server
                // side.
                Some(
                    users
                        .iter()
                        .map(|u| format!("{}:{}", account, u))
                        .collect::<Vec<_>>()
                        .join(","),
                )
            }
        }
        _ => None,
    }
}

/// An ordered access rule set for a container.
///
/// A new ACL is private: it grants nothing. Rules accumulate in
/// insertion order; mutation never reorders or deduplicates, and
/// duplicate-equivalent rules all appear in the serialized headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acl {
    rules: Vec<Rule>,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// An ACL granting public read access: any referrer may read, and
    /// listings are allowed.
    pub fn make_public() -> Self {
        let mut acl = Self::new();
        acl.add_referrer(READ, "*");
        acl.allow_listings();
        acl
    }

    /// An ACL granting nothing.
    pub fn make_private() -> Self {
        Self::new()
    }

    /// Build an ACL from response headers.
    ///
    /// Read-header tokens are parsed first (as READ rules), then
    /// write-header tokens (as WRITE), left to right. Malformed tokens
    /// are dropped; absent or empty headers contribute no rules, so
    /// headerless input yields a private ACL.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut acl = Self::new();
        acl.parse_header(headers, HEADER_READ, READ);
        acl.parse_header(headers, HEADER_WRITE, WRITE);
        acl
    }

    fn parse_header(&mut self, headers: &HeaderMap, name: &str, mask: u8) {
        let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
            return;
        };
        for token in value.split(',') {
            if let Some(rule) = parse_rule(mask, token) {
                self.rules.push(rule);
            }
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Grant access to an account. With users given, only those users
    /// of the account are granted; with none, every user is.
    pub fn add_account(&mut self, mask: u8, account: &str, users: &[&str]) -> &mut Self {
        self.add_rule(
            mask,
            Grant::Account {
                account: account.to_string(),
                users: users.iter().map(|u| u.to_string()).collect(),
            },
        )
    }

    /// Allow (or, with a leading `-`, deny) a host name or pattern.
    /// Current Swift only honors referrer rules under READ.
    pub fn add_referrer(&mut self, mask: u8, host: &str) -> &mut Self {
        self.add_rule(mask, Grant::Referrer(host.to_string()))
    }

    /// Allow hosts with READ permission to also list the container's
    /// contents. READ alone does not grant listings.
    pub fn allow_listings(&mut self) -> &mut Self {
        self.add_rule(READ, Grant::Listings)
    }

    /// Append a rule, stamping the permission mask onto the grant.
    pub fn add_rule(&mut self, mask: u8, grant: Grant) -> &mut Self {
        self.rules.push(Rule { mask, grant });
        self
    }

    /// Render the rule set as its two wire headers. A header is only
    /// present when at least one of its rules rendered non-empty.
    pub fn headers(&self) -> Vec<(HeaderName, String)> {
        let mut readers = Vec::new();
        let mut writers = Vec::new();

        for rule in &self.rules {
            if rule.mask & READ != 0 {
                if let Some(token) = rule_to_string(READ, rule) {
                    readers.push(token);
                }
            }
            if rule.mask & WRITE != 0 {
                if let Some(token) = rule_to_string(WRITE, rule) {
                    writers.push(token);
                }
            }
        }

        let mut out = Vec::new();
        if !readers.is_empty() {
            out.push((
                HeaderName::from_static("x-container-read"),
                readers.join(","),
            ));
        }
        if !writers.is_empty() {
            out.push((
                HeaderName::from_static("x-container-write"),
                writers.join(","),
            ));
        }
        out
    }

    /// The wire headers as a ready-to-send `HeaderMap`.
    pub fn header_map(&self) -> Result<HeaderMap, http::Error> {
        let mut map = HeaderMap::new();
        for (name, value) in self.headers() {
            map.insert(name, HeaderValue::from_str(&value)?);
        }
        Ok(map)
    }

    /// Whether this ACL grants nothing at all.
    ///
    /// This inspects the rule count only. A rule set whose entries all
    /// render to empty tokens (say, a WRITE-masked listings rule) is
    /// still "not private" here even though no header would be sent.
    pub fn is_private(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether this ACL allows public reading: some rule grants
    /// listings and some referrer rule names the any-host pattern
    /// `*`. The scan looks at raw grants, not masks, and does not care
    /// whether other rules restrict anything else.
    pub fn is_public(&self) -> bool {
        let mut allows_all_hosts = false;
        let mut allows_listings = false;
        for rule in &self.rules {
            match &rule.grant {
                Grant::Listings => allows_listings = true,
                Grant::Referrer(host) if host.trim() == "*" => allows_all_hosts = true,
                _ => {}
            }
        }
        allows_all_hosts && allows_listings
    }
}

/// Renders the headers tab-joined, for debugging.
impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .headers()
            .into_iter()
            .map(|(name, value)| format!("{}: {}", display_name(&name), value))
            .collect();
        write!(f, "{}", rendered.join("\t"))
    }
}

fn display_name(name: &HeaderName) -> &'static str {
    if name.as_str() == "x-container-read" {
        HEADER_READ
    } else {
        HEADER_WRITE
    }
}
