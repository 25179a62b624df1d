use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

#[derive(Debug, Clone)]
pub struct Config {
    // snapshot configuration
    /// directory holding the snapshot artifacts produced
    ///  by the ingestion pipeline
    pub snapshot_dir: PathBuf,

    // http server configuration
    /// address for the gateway to listen on.
    ///  if not set then 0.0.0.0:8080 will be used
    pub listen_addr: Option<SocketAddr>,
    /// path of the login surface authentication challenges
    ///  redirect to
    pub login_path: String,
    /// mark session cookies Secure; set when serving over TLS
    pub cookie_secure: bool,

    // federated identity configuration
    /// hex-encoded Ed25519 public key of the identity provider,
    ///  if not set then federated-identity rules always challenge
    pub identity_key_hex: Option<String>,
    /// subjects allowed past federated-identity rules
    pub allowed_subjects: Vec<String>,

    // misc
    pub log_level: tracing::Level,

    /// expose the admin write API (disabled on read-only mirrors)
    pub admin_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("snapshot"),
            listen_addr: Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8080)),
            login_path: "/login".to_string(),
            cookie_secure: false,
            identity_key_hex: None,
            allowed_subjects: Vec::new(),
            log_level: tracing::Level::INFO,
            admin_enabled: true,
        }
    }
}
