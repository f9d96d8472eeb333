use crate::protocol::trace;
use crate::{ScnpError, ScnpResult};
use secstr::SecStr;
use std::time::Duration;

/// Everything that is needed to open a [`Session`](crate::Session).
///
/// Start from [`ConnectParams::builder`]:
///
/// ```
/// use scnp::ConnectParams;
///
/// let params = ConnectParams::builder("localhost", 30015)
///     .dbuser("SYSTEM")
///     .password("secret")
///     .autocommit(false)
///     .fetch_size(100)
///     .build()
///     .unwrap();
/// assert_eq!(params.dbuser(), "SYSTEM");
/// ```
#[derive(Debug)]
pub struct ConnectParams {
    host: String,
    port: u16,
    dbuser: String,
    password: SecStr,
    clientlocale: String,
    autocommit: bool,
    timeout: Option<Duration>,
    fetch_size: u32,
    trace: bool,
}

impl ConnectParams {
    /// A builder for connect parameters against `host:port`.
    ///
    /// The port of an on-premise instance NN is `3NN15`.
    pub fn builder(host: &str, port: u16) -> ConnectParamsBuilder {
        ConnectParamsBuilder {
            host: host.to_string(),
            port,
            dbuser: None,
            password: None,
            clientlocale: "en_US".to_string(),
            autocommit: true,
            timeout: Some(Duration::from_secs(30)),
            fetch_size: crate::DEFAULT_FETCH_SIZE,
            trace: trace::env_trace_enabled(),
        }
    }

    /// The database host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The database port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The database user.
    pub fn dbuser(&self) -> &str {
        &self.dbuser
    }

    pub(crate) fn password(&self) -> &SecStr {
        &self.password
    }

    pub(crate) fn clientlocale(&self) -> &str {
        &self.clientlocale
    }

    pub(crate) fn autocommit(&self) -> bool {
        self.autocommit
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn fetch_size(&self) -> u32 {
        self.fetch_size
    }

    pub(crate) fn trace(&self) -> bool {
        self.trace
    }
}

/// Builder for [`ConnectParams`].
#[derive(Debug)]
pub struct ConnectParamsBuilder {
    host: String,
    port: u16,
    dbuser: Option<String>,
    password: Option<SecStr>,
    clientlocale: String,
    autocommit: bool,
    timeout: Option<Duration>,
    fetch_size: u32,
    trace: bool,
}

impl ConnectParamsBuilder {
    /// Sets the database user (mandatory).
    pub fn dbuser(mut self, dbuser: &str) -> Self {
        self.dbuser = Some(dbuser.to_string());
        self
    }

    /// Sets the password (mandatory).
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(SecStr::from(password));
        self
    }

    /// Sets the client locale that is sent with the connect options
    /// (default: `en_US`).
    pub fn clientlocale(mut self, clientlocale: &str) -> Self {
        self.clientlocale = clientlocale.to_string();
        self
    }

    /// Switches auto-commit on or off (default: on).
    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    /// Sets the socket timeout; `None` blocks indefinitely (default: 30 s).
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of rows per FETCH roundtrip (default: 32).
    pub fn fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = fetch_size.max(1);
        self
    }

    /// Enables hex-dump tracing of every packet (default: off, unless the
    /// environment variable `HDB_TRACE` was set at startup).
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Builds the [`ConnectParams`].
    ///
    /// # Errors
    ///
    /// `ScnpError::Usage` if user or password are missing.
    pub fn build(self) -> ScnpResult<ConnectParams> {
        Ok(ConnectParams {
            host: self.host,
            port: self.port,
            dbuser: self
                .dbuser
                .ok_or_else(|| ScnpError::usage("database user is missing"))?,
            password: self
                .password
                .ok_or_else(|| ScnpError::usage("password is missing"))?,
            clientlocale: self.clientlocale,
            autocommit: self.autocommit,
            timeout: self.timeout,
            fetch_size: self.fetch_size,
            trace: self.trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectParams;

    #[test]
    fn builder_defaults() {
        let params = ConnectParams::builder("myhost", 30015)
            .dbuser("SYSTEM")
            .password("secret")
            .build()
            .unwrap();
        assert_eq!(params.host(), "myhost");
        assert_eq!(params.port(), 30015);
        assert!(params.autocommit());
        assert_eq!(params.fetch_size(), crate::DEFAULT_FETCH_SIZE);
        assert_eq!(params.timeout(), Some(std::time::Duration::from_secs(30)));
        // the password never shows up in debug output
        assert!(!format!("{params:?}").contains("secret"));
    }

    #[test]
    fn user_is_mandatory() {
        assert!(ConnectParams::builder("myhost", 30015)
            .password("secret")
            .build()
            .is_err());
    }
}
