//! Service extensions advertised in the EHLO reply.

/// An extension keyword from an EHLO reply line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS (RFC 3207).
    StartTls,
    /// AUTH with the advertised mechanisms (RFC 4954).
    Auth(Vec<AuthMechanism>),
    /// SIZE with an optional limit in bytes (RFC 1870).
    Size(Option<usize>),
    /// 8BITMIME.
    EightBitMime,
    /// PIPELINING.
    Pipelining,
    /// SMTPUTF8.
    SmtpUtf8,
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl Extension {
    /// Parses one EHLO capability line (without the reply code).
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            return Self::Unknown(line.to_string());
        };

        match keyword.to_ascii_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            // Some older servers advertise "AUTH=LOGIN PLAIN"
            "AUTH" => Self::Auth(words.filter_map(AuthMechanism::parse).collect()),
            kw if kw.starts_with("AUTH=") => {
                let first = AuthMechanism::parse(&keyword[5..]);
                Self::Auth(
                    first
                        .into_iter()
                        .chain(words.filter_map(AuthMechanism::parse))
                        .collect(),
                )
            }
            "SIZE" => Self::Size(words.next().and_then(|s| s.parse().ok())),
            "8BITMIME" => Self::EightBitMime,
            "PIPELINING" => Self::Pipelining,
            "SMTPUTF8" => Self::SmtpUtf8,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// SASL mechanisms this client can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// PLAIN (RFC 4616), sent as an initial response.
    Plain,
    /// LOGIN, the legacy two-step username/password exchange.
    Login,
}

impl AuthMechanism {
    /// Parses a mechanism name; unsupported mechanisms yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("PLAIN") {
            Some(Self::Plain)
        } else if s.eq_ignore_ascii_case("LOGIN") {
            Some(Self::Login)
        } else {
            None
        }
    }

    /// Returns the mechanism name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}
