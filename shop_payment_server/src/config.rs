use std::{env, io::Write};

use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use spg_common::{parse_boolean_flag, Secret};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8350;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Gateway notification settings: shared secrets and the signature-check switch.
    pub notify: NotifyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").unwrap_or_else(|_| DEFAULT_SPG_HOST.into());
        let port = match env::var("SPG_PORT") {
            Ok(s) => s.parse::<u16>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead.");
                DEFAULT_SPG_PORT
            }),
            Err(_) => DEFAULT_SPG_PORT,
        };
        let database_url = env::var("SPG_DATABASE_URL").unwrap_or_else(|_| {
            error!("🪛️ SPG_DATABASE_URL is not set. Please set it to the URL for the orders database.");
            String::default()
        });
        let notify = NotifyConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the notification configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            NotifyConfig::default()
        });
        Self { host, port, database_url, notify }
    }
}

//-------------------------------------------------  NotifyConfig  -----------------------------------------------------
#[derive(Clone, Debug)]
pub struct NotifyConfig {
    /// The shared secret used to verify Alipay notification signatures.
    pub alipay_secret: Secret<String>,
    /// The shared secret used to verify WeChat notification signatures.
    pub wechat_secret: Secret<String>,
    /// If true, the server will accept notifications without checking their signatures. **DANGER**
    pub disable_signature_check: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The gateway notification secrets have not been set. I'm using random values for this session. \
             Every inbound notification will fail verification, so no order can be reconciled. DO NOT operate on \
             production like this. 🚨️🚨️🚨️"
        );
        let alipay_secret = random_secret();
        let wechat_secret = random_secret();
        dump_secrets_to_tempfile(&alipay_secret, &wechat_secret);
        Self {
            alipay_secret: Secret::new(alipay_secret),
            wechat_secret: Secret::new(wechat_secret),
            disable_signature_check: false,
        }
    }
}

impl NotifyConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let alipay_secret = env::var("SPG_ALIPAY_NOTIFY_SECRET")
            .map_err(|e| ServerError::ConfigError(format!("{e} [SPG_ALIPAY_NOTIFY_SECRET]")))?;
        let wechat_secret = env::var("SPG_WECHAT_NOTIFY_SECRET")
            .map_err(|e| ServerError::ConfigError(format!("{e} [SPG_WECHAT_NOTIFY_SECRET]")))?;
        let disable_signature_check = parse_boolean_flag(env::var("SPG_DISABLE_SIGNATURE_CHECK").ok(), false);
        if disable_signature_check {
            warn!(
                "🚨️ Notification signature checks are DISABLED. Anyone who can reach this server can mark orders as \
                 paid. This setting exists for integration testing only."
            );
        }
        Ok(Self {
            alipay_secret: Secret::new(alipay_secret),
            wechat_secret: Secret::new(wechat_secret),
            disable_signature_check,
        })
    }
}

fn dump_secrets_to_tempfile(alipay_secret: &str, wechat_secret: &str) {
    match NamedTempFile::new().ok().and_then(|f| f.keep().ok()) {
        Some((mut file, path)) => {
            let doc = json!({
                "alipay_secret": alipay_secret,
                "wechat_secret": wechat_secret,
            })
            .to_string();
            match writeln!(file, "{doc}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The notification secrets for this session were written to {}. If this is a production \
                     instance, you are doing it wrong! Set the SPG_ALIPAY_NOTIFY_SECRET and SPG_WECHAT_NOTIFY_SECRET \
                     environment variables instead. 🚨️🚨️🚨️",
                    path.display()
                ),
                Err(e) => warn!("🪛️ Could not write the notification secrets to the temporary file. {e}"),
            }
        },
        None => warn!("🪛️ Could not create a temporary file to store the notification secrets."),
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect()
}
