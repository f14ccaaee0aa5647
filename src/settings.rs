use color_eyre::eyre::{self, eyre};
use homie5::{HomieDomain, HomieID};
use once_cell::sync::Lazy;
use rand::{distr::Alphanumeric, Rng};
use simple_kv_store::KubernetesResource;
use std::{env, path::PathBuf, process, str::FromStr};

pub static ENV_PREFIX: Lazy<String> = Lazy::new(|| "HCTIMED".to_string());

pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::default);

pub const CHANNEL_CAPACITY: usize = 65535;

fn env_name(name: &str) -> String {
    format!("{}_{}", *ENV_PREFIX, name)
}

#[derive(Default, Debug)]
pub struct Settings {
    pub homie: HomieSettings,
    pub app: AppSettings,
}

#[derive(Debug)]
pub struct AppSettings {
    pub params_config: ConfigBackend,
    pub value_store_config: ValueStoreConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            params_config: generic_setting(
                "PARAMS_CONFIG",
                ConfigBackend::File {
                    path: PathBuf::from("./params"),
                },
            ),
            value_store_config: generic_setting("VALUE_STORE_CONFIG", ValueStoreConfig::InMemory),
        }
    }
}

/// Source of the runtime parameter documents.
#[derive(Debug)]
pub enum ConfigBackend {
    File { path: PathBuf },
    Kubernetes { name: String, namespace: String },
    Mqtt { topic: String },
}

impl TryFrom<String> for ConfigBackend {
    type Error = eyre::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ConfigBackend {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((backend, rest)) = s.split_once(':') else {
            return Err(eyre!("Invalid format. Use 'file:/path', 'mqtt:topic' or 'kubernetes:name[,namespace]'"));
        };

        match backend.to_lowercase().as_str() {
            "file" => Ok(ConfigBackend::File { path: PathBuf::from(rest) }),
            "mqtt" => Ok(ConfigBackend::Mqtt { topic: rest.to_string() }),
            "kubernetes" => {
                let (name, namespace) = match rest.split_once(',') {
                    Some((name, namespace)) => (name.to_string(), namespace.to_string()),
                    None => (rest.to_string(), "default".to_string()),
                };
                Ok(ConfigBackend::Kubernetes { name, namespace })
            }
            _ => Err(eyre!("Unknown backend type. Use 'file', 'mqtt' or 'kubernetes'")),
        }
    }
}

#[derive(Debug)]
pub enum ValueStoreConfig {
    InMemory,
    Kubernetes {
        name: String,
        namespace: String,
        ressource_type: KubernetesResource,
    },
    Sqlite {
        path: String,
    },
}

impl TryFrom<String> for ValueStoreConfig {
    type Error = eyre::Report;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.split_once(':') {
            None if s.to_lowercase() == "inmemory" => Ok(ValueStoreConfig::InMemory),
            Some((backend, rest)) => match backend.to_lowercase().as_str() {
                "sqlite" => Ok(ValueStoreConfig::Sqlite { path: rest.to_string() }),
                "kubernetes" => {
                    let kube_parts: Vec<&str> = rest.splitn(3, ',').collect();
                    let ressource_type = match kube_parts[0] {
                        "secret" => KubernetesResource::Secret,
                        _ => KubernetesResource::ConfigMap,
                    };
                    let name = kube_parts.get(1).unwrap_or(&"").to_string();
                    let namespace = kube_parts.get(2).unwrap_or(&"default").to_string();
                    Ok(ValueStoreConfig::Kubernetes {
                        name,
                        namespace,
                        ressource_type,
                    })
                }
                _ => Err(invalid_value_store(&s)),
            },
            _ => Err(invalid_value_store(&s)),
        }
    }
}

fn invalid_value_store(s: &str) -> eyre::Report {
    eyre!(
        "Invalid value store config '{}'. Use 'inmemory', 'sqlite:/path/to/filename.db' or 'kubernetes:secret|configmap,name[,namespace]'",
        s
    )
}

#[derive(Debug)]
pub struct HomieSettings {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub homie_domain: HomieDomain,
    pub device_id: HomieID,
    pub device_name: String,
}

impl Default for HomieSettings {
    fn default() -> Self {
        let hostname = string_setting("HOMIE_HOST", "localhost");
        let port = number_setting("HOMIE_PORT", 1883u16);

        let username = string_setting("HOMIE_USERNAME", String::default());
        let password = string_setting("HOMIE_PASSWORD", String::default());
        let client_id = string_setting(
            "HOMIE_CLIENT_ID",
            format!(
                "hctimed-{}",
                rand::rng()
                    .sample_iter(&Alphanumeric)
                    .take(8)
                    .map(char::from)
                    .collect::<String>()
            ),
        );
        let homie_domain = generic_setting("HOMIE_DOMAIN", HomieDomain::Default);
        let device_id = generic_setting("HOMIE_DEVICE_ID", HomieID::new_const("timedata"));
        let device_name = string_setting("HOMIE_DEVICE_NAME", "Time Data");

        Self {
            hostname,
            port,
            username,
            password,
            client_id,
            homie_domain,
            device_id,
            device_name,
        }
    }
}

fn exit_invalid_setting(name: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("Error: invalid value for {}: {}", name, err);
    process::exit(1);
}

fn string_setting(name: &str, default: impl Into<String>) -> String {
    env::var(env_name(name)).ok().unwrap_or(default.into())
}

fn number_setting<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env::var(env_name(name))
        .ok()
        .map(|value| {
            value
                .parse::<T>()
                .unwrap_or_else(|err| exit_invalid_setting(&env_name(name), err))
        })
        .unwrap_or(default)
}

fn generic_setting<T>(name: &str, default: T) -> T
where
    T: TryFrom<String>,
    T::Error: std::fmt::Display,
{
    env::var(env_name(name))
        .ok()
        .map(|value| {
            value
                .try_into()
                .unwrap_or_else(|err| exit_invalid_setting(&env_name(name), err))
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_backends() {
        assert!(matches!(
            "file:/etc/timedata".parse::<ConfigBackend>(),
            Ok(ConfigBackend::File { path }) if path == PathBuf::from("/etc/timedata")
        ));
        assert!(matches!(
            "mqtt:timedata/params".parse::<ConfigBackend>(),
            Ok(ConfigBackend::Mqtt { topic }) if topic == "timedata/params"
        ));
        assert!(matches!(
            "kubernetes:timedata-params".parse::<ConfigBackend>(),
            Ok(ConfigBackend::Kubernetes { name, namespace }) if name == "timedata-params" && namespace == "default"
        ));
        assert!("redis:whatever".parse::<ConfigBackend>().is_err());
        assert!("./params".parse::<ConfigBackend>().is_err());
    }

    #[test]
    fn parses_value_store_configs() {
        assert!(matches!(
            ValueStoreConfig::try_from("inmemory".to_string()),
            Ok(ValueStoreConfig::InMemory)
        ));
        assert!(matches!(
            ValueStoreConfig::try_from("sqlite:/var/lib/timedata.db".to_string()),
            Ok(ValueStoreConfig::Sqlite { path }) if path == "/var/lib/timedata.db"
        ));
        assert!(matches!(
            ValueStoreConfig::try_from("kubernetes:secret,timedata,home".to_string()),
            Ok(ValueStoreConfig::Kubernetes { name, namespace, ressource_type: KubernetesResource::Secret })
                if name == "timedata" && namespace == "home"
        ));
        assert!(ValueStoreConfig::try_from("postgres:nope".to_string()).is_err());
    }
}
