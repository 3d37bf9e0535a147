//! Settings Translator: external setting identifiers and units to engine
//! methods and units, and back.
//!
//! # Design
//! - One immutable [`SettingsTable`] is built at start-up and shared; nothing
//!   mutates it afterwards.
//! - Each descriptor names its engine getter, its engine setter, and a
//!   [`Transform`] applied in both directions. Passthrough is the default.
//! - Identifiers missing from the table are forwarded unchanged: the id is
//!   used as the getter name and `<id>.set` as the setter.

use std::collections::BTreeMap;

use floodgate_rpc::{MethodCall, RpcValue};
use serde_json::{Number, Value};

use crate::error::{ConfigError, ConfigResult};

const KIB: i64 = 1024;
const MIB: i64 = 1024 * 1024;

/// Value conversion applied between the engine and external callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Values pass through unchanged.
    Passthrough,
    /// Engine stores `0`/`1`; callers see booleans.
    Flag,
    /// Engine stores `external * factor`.
    Scaled {
        /// Multiplier from external units to engine units.
        factor: i64,
        /// Engine expects the written value as a decimal string.
        write_as_string: bool,
    },
    /// Engine stores `"auto"`/`"disable"` (read back via DHT statistics);
    /// callers see a boolean.
    DhtMode,
}

/// Mapping of one external identifier onto engine methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDescriptor {
    /// Identifier exposed to callers.
    pub external_id: &'static str,
    /// Engine getter.
    pub read_method: &'static str,
    /// Engine setter.
    pub write_method: &'static str,
    /// Unit/type conversion.
    pub transform: Transform,
}

impl SettingDescriptor {
    /// Descriptor whose setter is `<read_method>.set`.
    #[must_use]
    pub const fn new(
        external_id: &'static str,
        read_method: &'static str,
        write_method: &'static str,
    ) -> Self {
        Self {
            external_id,
            read_method,
            write_method,
            transform: Transform::Passthrough,
        }
    }

    /// Replace the transform.
    #[must_use]
    pub const fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

macro_rules! setting {
    ($id:literal, $method:literal) => {
        SettingDescriptor::new($id, $method, concat!($method, ".set"))
    };
    ($id:literal, $method:literal, $transform:expr) => {
        SettingDescriptor::new($id, $method, concat!($method, ".set")).with_transform($transform)
    };
}

const STANDARD_SETTINGS: &[SettingDescriptor] = &[
    setting!(
        "downloadRateLimit",
        "throttle.global_down.max_rate",
        Transform::Scaled {
            factor: KIB,
            write_as_string: false
        }
    ),
    setting!(
        "uploadRateLimit",
        "throttle.global_up.max_rate",
        Transform::Scaled {
            factor: KIB,
            write_as_string: false
        }
    ),
    setting!(
        "piecesMemoryMax",
        "pieces.memory.max",
        Transform::Scaled {
            factor: MIB,
            write_as_string: true
        }
    ),
    SettingDescriptor::new("dhtEnabled", "dht.statistics", "dht.mode.set")
        .with_transform(Transform::DhtMode),
    setting!("dhtPort", "dht.port"),
    setting!("peerExchange", "protocol.pex", Transform::Flag),
    setting!("minPeersNormal", "throttle.min_peers.normal"),
    setting!("maxPeersNormal", "throttle.max_peers.normal"),
    setting!("minPeersSeed", "throttle.min_peers.seed"),
    setting!("maxPeersSeed", "throttle.max_peers.seed"),
    setting!("maxDownloads", "throttle.max_downloads"),
    setting!("maxUploads", "throttle.max_uploads"),
    setting!("trackersNumWant", "trackers.numwant"),
    setting!("networkPortRange", "network.port_range"),
    setting!("networkPortRandom", "network.port_random", Transform::Flag),
    setting!("networkPortOpen", "network.port_open", Transform::Flag),
    setting!("networkLocalAddress", "network.local_address"),
    setting!("networkBindAddress", "network.bind_address"),
    setting!("networkHttpMaxOpen", "network.http.max_open"),
    setting!("networkMaxOpenFiles", "network.max_open_files"),
    setting!("networkMaxOpenSockets", "network.max_open_sockets"),
    setting!("directoryDefault", "directory.default"),
    setting!("maxFileSize", "system.file.max_size"),
    setting!(
        "piecesHashOnCompletion",
        "pieces.hash.on_completion",
        Transform::Flag
    ),
];

/// Immutable external-id → engine mapping.
#[derive(Debug, Clone)]
pub struct SettingsTable {
    entries: BTreeMap<&'static str, SettingDescriptor>,
}

impl SettingsTable {
    /// The mapping for every externally exposed engine setting.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_SETTINGS
                .iter()
                .map(|descriptor| (descriptor.external_id, *descriptor))
                .collect(),
        }
    }

    /// Build a table from explicit descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateSetting`] if two descriptors share an id.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = SettingDescriptor>,
    ) -> ConfigResult<Self> {
        let mut entries = BTreeMap::new();
        for descriptor in descriptors {
            if entries
                .insert(descriptor.external_id, descriptor)
                .is_some()
            {
                return Err(ConfigError::DuplicateSetting {
                    id: descriptor.external_id,
                });
            }
        }
        Ok(Self { entries })
    }

    /// Look up a known setting.
    #[must_use]
    pub fn descriptor(&self, id: &str) -> Option<&SettingDescriptor> {
        self.entries.get(id)
    }

    /// External identifiers of every known setting, in lexical order.
    pub fn external_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of known settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Engine call reading `id`.
    #[must_use]
    pub fn read_call(&self, id: &str) -> MethodCall {
        match self.descriptor(id) {
            Some(descriptor) => MethodCall::new(descriptor.read_method),
            None => MethodCall::new(id),
        }
    }

    /// Engine call writing the external `value` to `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] when the value cannot be converted.
    pub fn write_call(&self, id: &str, value: &Value) -> ConfigResult<MethodCall> {
        let method = self
            .descriptor(id)
            .map_or_else(|| format!("{id}.set"), |descriptor| descriptor.write_method.to_string());
        Ok(MethodCall::new(method).arg("").arg(self.inbound(id, value)?))
    }

    /// Convert an engine value into the external vocabulary (reads).
    #[must_use]
    pub fn outbound(&self, id: &str, value: RpcValue) -> Value {
        let transform = self
            .descriptor(id)
            .map_or(Transform::Passthrough, |descriptor| descriptor.transform);
        match transform {
            Transform::Passthrough => value.to_json(),
            Transform::Flag => value
                .as_bool()
                .map_or_else(|| value.to_json(), Value::Bool),
            Transform::Scaled { factor, .. } => value
                .as_i64()
                .map_or_else(|| value.to_json(), |raw| scale_down(raw, factor)),
            Transform::DhtMode => {
                let mode = value.member("dht").unwrap_or(&value).as_str();
                Value::Bool(matches!(mode, Some(mode) if mode != "disable" && mode != "off"))
            }
        }
    }

    /// Convert an external value into the engine vocabulary (writes).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] when the value has the wrong shape.
    pub fn inbound(&self, id: &str, value: &Value) -> ConfigResult<RpcValue> {
        let invalid = |reason| ConfigError::InvalidSetting {
            id: id.to_string(),
            reason,
        };
        let Some(descriptor) = self.descriptor(id) else {
            return Ok(forward(value));
        };
        match descriptor.transform {
            Transform::Passthrough | Transform::Flag => {
                scalar(value).ok_or_else(|| invalid("unsupported value type"))
            }
            Transform::Scaled {
                factor,
                write_as_string,
            } => {
                let external = numeric(value).ok_or_else(|| invalid("expected a number"))?;
                let engine = scale_up(external, factor).ok_or_else(|| invalid("out of range"))?;
                Ok(if write_as_string {
                    RpcValue::String(engine.to_string())
                } else {
                    RpcValue::Int(engine)
                })
            }
            Transform::DhtMode => {
                let enabled = match value {
                    Value::Bool(flag) => *flag,
                    Value::String(mode) => mode != "disable" && mode != "off",
                    _ => return Err(invalid("expected a boolean")),
                };
                Ok(RpcValue::from(if enabled { "auto" } else { "disable" }))
            }
        }
    }
}

impl Default for SettingsTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[allow(clippy::cast_precision_loss)]
fn scale_down(raw: i64, factor: i64) -> Value {
    if raw % factor == 0 {
        Value::from(raw / factor)
    } else {
        Number::from_f64(raw as f64 / factor as f64)
            .map_or(Value::from(raw / factor), Value::Number)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn scale_up(external: f64, factor: i64) -> Option<i64> {
    let scaled = (external * factor as f64).round();
    if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled <= i64::MAX as f64 {
        Some(scaled as i64)
    } else {
        None
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn scalar(value: &Value) -> Option<RpcValue> {
    match value {
        Value::Bool(flag) => Some(RpcValue::from(*flag)),
        Value::Number(number) => number.as_i64().map(RpcValue::Int),
        Value::String(text) => Some(RpcValue::String(text.clone())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Lossless conversion for identifiers the table does not model.
fn forward(value: &Value) -> RpcValue {
    match value {
        Value::Null => RpcValue::Nil,
        Value::Bool(flag) => RpcValue::from(*flag),
        Value::Number(number) => number
            .as_i64()
            .map_or_else(|| RpcValue::String(number.to_string()), RpcValue::Int),
        Value::String(text) => RpcValue::String(text.clone()),
        Value::Array(items) => RpcValue::List(items.iter().map(forward).collect()),
        Value::Object(fields) => RpcValue::Struct(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), forward(field)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rate_limits_round_trip_through_kilobytes() -> anyhow::Result<()> {
        let table = SettingsTable::standard();
        let call = table.write_call("downloadRateLimit", &json!(100))?;
        assert_eq!(call.method, "throttle.global_down.max_rate.set");
        assert_eq!(call.args, vec![RpcValue::from(""), RpcValue::Int(102_400)]);
        assert_eq!(
            table.outbound("downloadRateLimit", RpcValue::Int(102_400)),
            json!(100)
        );
        assert_eq!(
            table.outbound("uploadRateLimit", RpcValue::Int(1536)),
            json!(1.5)
        );
        Ok(())
    }

    #[test]
    fn piece_memory_is_exposed_in_megabytes_and_written_as_string() -> anyhow::Result<()> {
        let table = SettingsTable::standard();
        assert_eq!(
            table.inbound("piecesMemoryMax", &json!(256))?,
            RpcValue::String("268435456".into())
        );
        assert_eq!(
            table.outbound("piecesMemoryMax", RpcValue::from("268435456")),
            json!(256)
        );
        Ok(())
    }

    #[test]
    fn dht_state_maps_to_boolean() -> anyhow::Result<()> {
        let table = SettingsTable::standard();
        let stats = RpcValue::Struct(BTreeMap::from([(
            "dht".to_string(),
            RpcValue::from("auto"),
        )]));
        assert_eq!(table.outbound("dhtEnabled", stats), json!(true));
        assert_eq!(
            table.outbound("dhtEnabled", RpcValue::from("disable")),
            json!(false)
        );

        let call = table.write_call("dhtEnabled", &json!(false))?;
        assert_eq!(call.method, "dht.mode.set");
        assert_eq!(call.args[1], RpcValue::from("disable"));
        assert_eq!(table.read_call("dhtEnabled").method, "dht.statistics");
        Ok(())
    }

    #[test]
    fn flags_and_passthrough_values() -> anyhow::Result<()> {
        let table = SettingsTable::standard();
        assert_eq!(table.outbound("peerExchange", RpcValue::Int(1)), json!(true));
        assert_eq!(table.inbound("peerExchange", &json!(false))?, RpcValue::Int(0));
        assert_eq!(
            table.outbound("networkPortRange", RpcValue::from("6881-6889")),
            json!("6881-6889")
        );
        assert_eq!(table.inbound("maxPeersSeed", &json!(50))?, RpcValue::Int(50));
        Ok(())
    }

    #[test]
    fn unknown_identifiers_are_forwarded_unchanged() -> anyhow::Result<()> {
        let table = SettingsTable::standard();
        assert!(table.descriptor("session.path").is_none());
        assert_eq!(table.read_call("session.path").method, "session.path");
        let call = table.write_call("session.path", &json!("/var/lib/rtorrent"))?;
        assert_eq!(call.method, "session.path.set");
        assert_eq!(call.args[1], RpcValue::from("/var/lib/rtorrent"));
        assert_eq!(
            table.outbound("session.path", RpcValue::Int(7)),
            json!(7)
        );
        Ok(())
    }

    #[test]
    fn malformed_values_are_rejected() {
        let table = SettingsTable::standard();
        assert_eq!(
            table.inbound("downloadRateLimit", &json!("fast")),
            Err(ConfigError::InvalidSetting {
                id: "downloadRateLimit".into(),
                reason: "expected a number"
            })
        );
        assert!(table.inbound("dhtEnabled", &json!(3)).is_err());
        assert!(table.inbound("maxUploads", &json!([1])).is_err());
        assert!(table.inbound("maxPeersSeed", &json!(1.5)).is_err());
    }

    #[test]
    fn unknown_identifiers_keep_structured_and_fractional_values() -> anyhow::Result<()> {
        let table = SettingsTable::standard();
        let call = table.write_call("dht", &json!(["auto"]))?;
        assert_eq!(call.method, "dht.set");
        assert_eq!(call.args[1], RpcValue::List(vec![RpcValue::from("auto")]));

        assert_eq!(
            table.inbound("throttle.foo", &json!(1.5))?,
            RpcValue::String("1.5".into())
        );
        assert_eq!(
            table.inbound("custom.meta", &json!({"label": "tv", "weight": 2, "note": null}))?,
            RpcValue::Struct(BTreeMap::from([
                ("label".to_string(), RpcValue::from("tv")),
                ("note".to_string(), RpcValue::Nil),
                ("weight".to_string(), RpcValue::Int(2)),
            ]))
        );
        Ok(())
    }

    #[test]
    fn standard_table_has_unique_ids_and_covers_required_settings() -> anyhow::Result<()> {
        let table = SettingsTable::from_descriptors(STANDARD_SETTINGS.iter().copied())?;
        assert_eq!(table.len(), STANDARD_SETTINGS.len());
        for id in [
            "downloadRateLimit",
            "uploadRateLimit",
            "piecesMemoryMax",
            "dhtEnabled",
            "peerExchange",
            "minPeersNormal",
            "maxPeersNormal",
            "minPeersSeed",
            "maxPeersSeed",
            "networkPortRange",
            "networkPortRandom",
            "networkPortOpen",
        ] {
            assert!(table.descriptor(id).is_some(), "missing {id}");
        }

        let duplicate = SettingsTable::from_descriptors([
            SettingDescriptor::new("a", "x", "x.set"),
            SettingDescriptor::new("a", "y", "y.set"),
        ]);
        assert_eq!(
            duplicate.err(),
            Some(ConfigError::DuplicateSetting { id: "a" })
        );
        Ok(())
    }
}
